//! CLI integration tests using assert_cmd.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{gradesync, Session, MODEL_JSON};
use gradesync_io::store::{self, FINAL_MARKS_FILE};

#[test]
fn help_output() {
    gradesync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam score adjustment"));
}

#[test]
fn version_output() {
    gradesync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gradesync"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    gradesync()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gradesync.toml"));
    assert!(dir.path().join("gradesync.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    gradesync().current_dir(dir.path()).arg("init").assert().success();
    gradesync()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_reports_models() {
    let session = Session::new();
    gradesync()
        .arg("validate")
        .arg("--exam-dir")
        .arg(session.exam_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam models: 1 (max score 4)"))
        .stdout(predicate::str::contains("All models valid."));
}

#[test]
fn validate_flags_ungraded_questions() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("exam_model_A_questions.json"),
        r#"{"questions": [
            {"id": 1, "options": [{"text": "a"}, {"text": "b"}], "correct_answer_index": 1},
            {"id": 2, "text": "How was the course?", "options": [{"text": "good"}, {"text": "bad"}]}
        ]}"#,
    )
    .unwrap();
    gradesync()
        .arg("validate")
        .arg("--exam-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 ungraded question(s) found."));
}

#[test]
fn validate_empty_directory_fails() {
    let dir = TempDir::new().unwrap();
    gradesync()
        .arg("validate")
        .arg("--exam-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("no exam_model_*_questions.json files"));
}

#[test]
fn analyze_writes_store_and_statistics() {
    let session = Session::new();
    session
        .analyze()
        .assert()
        .success()
        .stdout(predicate::str::contains("Mark Statistics"))
        .stdout(predicate::str::contains("5.00"))
        .stdout(predicate::str::contains("Mark Distribution"))
        .stdout(predicate::str::contains("A12B"));

    let loaded = store::load_results(&session.path().join(FINAL_MARKS_FILE)).unwrap();
    let marks: Vec<f64> = loaded.results.iter().map(|r| r.mark).collect();
    assert_eq!(marks, vec![10.0, 5.0, 0.0]);
    assert!(session.path().join("grading_report.json").exists());
    let summary = std::fs::read_to_string(session.path().join("grading_report.md")).unwrap();
    assert!(summary.starts_with("# Grading Report"));
    assert!(summary.contains("**Students:** 3"));
}

#[test]
fn analyze_applies_penalty_and_normalizes_sign() {
    for penalty in ["0.25", "-0.25"] {
        let session = Session::new();
        session.analyze().args(["--penalty", penalty]).assert().success();
        let loaded = store::load_results(&session.path().join(FINAL_MARKS_FILE)).unwrap();
        let second = &loaded.results[1];
        assert_eq!(second.score, 1.75);
        assert_eq!(second.incorrect_count, 1);
        assert_eq!(second.na_count, 1);
        assert_eq!(second.mark, 4.375);
    }
}

#[test]
fn analyze_void_nicely_never_lowers_marks() {
    let session = Session::new();
    session.analyze().args(["--void-nicely", "4"]).assert().success();
    let loaded = store::load_results(&session.path().join(FINAL_MARKS_FILE)).unwrap();
    // A12B missed question 4: max drops to 3.
    assert_eq!(loaded.results[1].max_score, 3);
    assert!((loaded.results[1].mark - 20.0 / 3.0).abs() < 1e-9);
    // A123 answered it correctly: still 4/4.
    assert_eq!(loaded.results[0].max_score, 4);
}

#[test]
fn analyze_counts_unknown_models() {
    let session = Session::new();
    std::fs::write(
        session.path().join("correction_results.csv"),
        "student_id,model_id,answer_1\nA1,9,A\n",
    )
    .unwrap();
    session
        .analyze()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 answer sheet(s) used an unknown model"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(session.path().join("grading_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["data_quality"]["unknown_model_rows"], 1);
}

#[test]
fn analyze_missing_answers_fails() {
    let session = Session::new();
    std::fs::remove_file(session.path().join("correction_results.csv")).unwrap();
    session
        .analyze()
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
    assert!(!session.path().join(FINAL_MARKS_FILE).exists());
}

#[test]
fn fill_marks_exact_only() {
    let session = Session::new();
    session.analyze().assert().success();
    session
        .fill_marks()
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched 1/3 students."))
        .stdout(predicate::str::contains("fuzzy match").not());

    let filled = std::fs::read_to_string(session.filled_roster()).unwrap();
    assert_eq!(filled, "ID,Name,Mark\nA123,Ann,10\nA12C,Bea,\nQ555,Cid,\n");
    assert_eq!(
        std::fs::read_to_string(session.roster()).unwrap(),
        common::ROSTER_CSV
    );
}

#[test]
fn fill_marks_fuzzy_rewrites_store() {
    let session = Session::new();
    session.analyze().assert().success();
    session
        .fill_marks()
        .args(["--fuzzy-threshold", "70"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched 2/3 students."))
        .stdout(predicate::str::contains("1 exact and 1 fuzzy match(es)."))
        .stdout(predicate::str::contains("Unmatched roster ids: Q555"))
        .stdout(predicate::str::contains("Unmatched detected ids: Z999"));

    let filled = std::fs::read_to_string(session.filled_roster()).unwrap();
    assert_eq!(filled, "ID,Name,Mark\nA123,Ann,10\nA12C,Bea,5\nQ555,Cid,\n");

    let loaded = store::load_results(&session.path().join(FINAL_MARKS_FILE)).unwrap();
    assert_eq!(loaded.results[1].student_id, "A12C");
    assert_eq!(loaded.results[1].student_name.as_deref(), Some("Bea"));
    assert_eq!(loaded.results[0].student_name.as_deref(), Some("Ann"));
    assert_eq!(loaded.results[2].student_id, "Z999");
    assert!(session.path().join("identity_map.json").exists());
    assert!(session.path().join("reconciliation_report.json").exists());
}

#[test]
fn fill_marks_simplify_strips_hash() {
    let session = Session::new();
    std::fs::write(session.roster(), "Email,ID,Name,#Nota\na@x,A123,Ann,\n").unwrap();
    session.analyze().args(["--penalty", "0.25"]).assert().success();
    gradesync()
        .current_dir(session.path())
        .arg("fill-marks")
        .arg("--roster")
        .arg(session.roster())
        .arg("--output-dir")
        .arg(session.path())
        .args(["--id-column", "ID", "--name-column", "Name", "--mark-column", "#Nota"])
        .args(["--simplify", "--separator", "semi", "--decimal-separator", ","])
        .assert()
        .failure()
        .stderr(predicate::str::contains("column 'ID' not found"));

    std::fs::write(session.roster(), "Email;ID;Name;#Nota\na@x;A12B;Ann;\n").unwrap();
    gradesync()
        .current_dir(session.path())
        .arg("fill-marks")
        .arg("--roster")
        .arg(session.roster())
        .arg("--output-dir")
        .arg(session.path())
        .args(["--id-column", "ID", "--name-column", "Name", "--mark-column", "#Nota"])
        .args(["--simplify", "--separator", "semi", "--decimal-separator", ","])
        .assert()
        .success();
    let filled = std::fs::read_to_string(session.filled_roster()).unwrap();
    assert_eq!(filled, "ID;Name;Nota\nA12B;Ann;4,38\n");
}

#[test]
fn fill_marks_without_store_fails() {
    let session = Session::new();
    session
        .fill_marks()
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `gradesync analyze` first"));
    assert!(!session.filled_roster().exists());
}

#[test]
fn fill_marks_requires_id_column() {
    let session = Session::new();
    session.analyze().assert().success();
    gradesync()
        .current_dir(session.path())
        .arg("fill-marks")
        .arg("--roster")
        .arg(session.roster())
        .arg("--output-dir")
        .arg(session.path())
        .args(["--mark-column", "Mark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing setting"));
}

#[test]
fn fill_marks_rejects_bad_threshold() {
    let session = Session::new();
    session.analyze().assert().success();
    session
        .fill_marks()
        .args(["--fuzzy-threshold", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("within 0..=100"));
}

#[test]
fn fill_marks_reads_config_file() {
    let session = Session::new();
    session.analyze().assert().success();
    std::fs::write(
        session.path().join("gradesync.toml"),
        "[matching]\nthreshold = 70\n\n[roster]\nid_column = \"ID\"\nmark_column = \"Mark\"\n",
    )
    .unwrap();
    common::gradesync()
        .current_dir(session.path())
        .arg("fill-marks")
        .arg("--roster")
        .arg(session.roster())
        .arg("--output-dir")
        .arg(session.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched 2/3 students."));
}

#[test]
fn grade_runs_both_steps() {
    let session = Session::new();
    gradesync()
        .current_dir(session.path())
        .arg("grade")
        .arg("--exam-dir")
        .arg(session.exam_dir())
        .arg("--output-dir")
        .arg(session.path())
        .arg("--roster")
        .arg(session.roster())
        .args(["--id-column", "ID", "--mark-column", "Mark", "--fuzzy-threshold", "70"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mark Statistics"))
        .stdout(predicate::str::contains("Matched 2/3 students."));
    assert!(session.filled_roster().exists());
}

#[test]
fn shuffle_writes_loadable_models() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("questions.json");
    std::fs::write(&base, MODEL_JSON).unwrap();
    let out = dir.path().join("models");

    gradesync()
        .arg("shuffle")
        .arg("--questions")
        .arg(&base)
        .args(["--models", "3", "--question-seed", "7"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exam_model_3_questions.json"));

    gradesync()
        .arg("validate")
        .arg("--exam-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam models: 3 (max score 4)"));
}
