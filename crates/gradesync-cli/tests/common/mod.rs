//! Shared fixtures for CLI tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub fn gradesync() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("gradesync").unwrap()
}

/// Four questions with answers A, B, C, D.
pub const MODEL_JSON: &str = r#"{
  "questions": [
    {"id": 1, "text": "One", "options": [{"text": "a"}, {"text": "b"}, {"text": "c"}, {"text": "d"}], "correct_answer_index": 0},
    {"id": 2, "text": "Two", "options": [{"text": "a"}, {"text": "b"}, {"text": "c"}, {"text": "d"}], "correct_answer_index": 1},
    {"id": 3, "text": "Three", "options": [{"text": "a"}, {"text": "b"}, {"text": "c"}, {"text": "d"}], "correct_answer_index": 2},
    {"id": 4, "text": "Four", "options": [{"text": "a"}, {"text": "b"}, {"text": "c"}, {"text": "d"}], "correct_answer_index": 3}
  ]
}"#;

/// A123 scores 4/4, A12B 2/4 with one wrong answer, Z999 left everything blank.
pub const ANSWERS_CSV: &str = "student_id,student_name,model_id,answer_1,answer_2,answer_3,answer_4
A123,,1,A,B,C,D
A12B,,1,A,B,NA,A
Z999,,1,NA,NA,NA,NA
";

/// A12C is one character away from the detected A12B; Q555 never sat the exam.
pub const ROSTER_CSV: &str = "ID,Name
A123,Ann
A12C,Bea
Q555,Cid
";

pub struct Session {
    pub dir: TempDir,
}

impl Session {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let exam = dir.path().join("exam");
        std::fs::create_dir_all(&exam).unwrap();
        std::fs::write(exam.join("exam_model_1_questions.json"), MODEL_JSON).unwrap();
        std::fs::write(dir.path().join("correction_results.csv"), ANSWERS_CSV).unwrap();
        std::fs::write(dir.path().join("class.csv"), ROSTER_CSV).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn exam_dir(&self) -> PathBuf {
        self.path().join("exam")
    }

    pub fn roster(&self) -> PathBuf {
        self.path().join("class.csv")
    }

    pub fn filled_roster(&self) -> PathBuf {
        self.path().join("class_with_marks.csv")
    }

    pub fn analyze(&self) -> Command {
        let mut cmd = gradesync();
        cmd.current_dir(self.path())
            .arg("analyze")
            .arg("--exam-dir")
            .arg(self.exam_dir())
            .arg("--output-dir")
            .arg(self.path());
        cmd
    }

    pub fn fill_marks(&self) -> Command {
        let mut cmd = gradesync();
        cmd.current_dir(self.path())
            .arg("fill-marks")
            .arg("--roster")
            .arg(self.roster())
            .arg("--output-dir")
            .arg(self.path())
            .args(["--id-column", "ID", "--name-column", "Name", "--mark-column", "Mark"]);
        cmd
    }
}
