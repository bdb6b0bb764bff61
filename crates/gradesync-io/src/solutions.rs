//! Exam model solution files.
//!
//! Each model lives in `exam_model_<ID>_questions.json`:
//!
//! ```json
//! {"questions": [{"id": 1, "text": "...", "options": [{"text": "..."}], "correct_answer_index": 0}]}
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradesync_core::model::{Question, SolutionModel, SolutionStore};

use crate::atomic;
use crate::error::InputError;

const PREFIX: &str = "exam_model_";
const SUFFIX: &str = "_questions.json";

#[derive(Debug, Serialize, Deserialize)]
struct QuestionsFile {
    questions: Vec<Question>,
}

/// The model id encoded in a solution file name, if it is one.
pub fn model_id_from_file_name(name: &str) -> Option<&str> {
    let id = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let valid = !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then_some(id)
}

pub fn solution_file_name(model_id: &str) -> String {
    format!("{PREFIX}{model_id}{SUFFIX}")
}

/// Read a bare question list file (`{"questions": [...]}`).
pub fn read_questions(path: &Path) -> Result<Vec<Question>> {
    if !path.exists() {
        return Err(InputError::MissingFile(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read questions from {}", path.display()))?;
    let file: QuestionsFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse questions JSON: {}", path.display()))?;
    Ok(file.questions)
}

/// Load every solution file in `dir`. Any invalid file aborts the load.
pub fn load_solutions(dir: &Path) -> Result<SolutionStore> {
    if !dir.is_dir() {
        return Err(InputError::MissingFile(dir.to_path_buf()).into());
    }

    let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            model_id_from_file_name(&name).map(|id| (id.to_string(), entry.path()))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(InputError::NoSolutions(dir.to_path_buf()).into());
    }

    let mut store = SolutionStore::new();
    for (model_id, path) in files {
        let questions = read_questions(&path)?;
        let model = SolutionModel::new(model_id.as_str(), questions)
            .with_context(|| format!("invalid solutions in {}", path.display()))?;
        tracing::info!(
            "loaded model '{}': {} questions ({} gradable)",
            model.id(),
            model.questions().count(),
            model.gradable_count()
        );
        store.insert(model);
    }

    Ok(store)
}

/// Write one model as `exam_model_<ID>_questions.json` in `dir`.
pub fn save_model(dir: &Path, model: &SolutionModel) -> Result<PathBuf> {
    let path = dir.join(solution_file_name(model.id()));
    let file = QuestionsFile {
        questions: model.questions().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&file).context("failed to serialize questions")?;
    atomic::write_bytes(&path, json.as_bytes())?;
    Ok(path)
}
