//! Detected answer sheets (`correction_results.csv`).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use gradesync_core::model::{AnswerValue, QuestionId, StudentAnswerRow};

use crate::error::InputError;

/// Default file name written by the detection step.
pub const ANSWERS_FILE: &str = "correction_results.csv";

const ANSWER_PREFIX: &str = "answer_";

/// Read detected answer rows in file order.
///
/// Requires `student_id` and `model_id` columns; `student_name` is optional.
/// Every `answer_<n>` column is parsed as the answer to question `n`.
pub fn read_answers(path: &Path) -> Result<Vec<StudentAnswerRow>> {
    if !path.exists() {
        return Err(InputError::MissingFile(path.to_path_buf()).into());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let column = |name: &str| -> Result<usize, InputError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| InputError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let id_col = column("student_id")?;
    let model_col = column("model_id")?;
    let name_col = column("student_name").ok();
    let answer_cols: Vec<(usize, QuestionId)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| {
            let qid = h.trim().strip_prefix(ANSWER_PREFIX)?.parse().ok()?;
            Some((idx, qid))
        })
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

        let answers: BTreeMap<QuestionId, AnswerValue> = answer_cols
            .iter()
            .filter(|&&(idx, _)| !field(idx).is_empty())
            .map(|&(idx, qid)| (qid, AnswerValue::parse(field(idx))))
            .collect();

        rows.push(StudentAnswerRow {
            detected_id: field(id_col).to_string(),
            name: name_col
                .map(field)
                .filter(|n| !n.is_empty())
                .map(String::from),
            model_id: field(model_col).to_string(),
            answers,
        });
    }

    tracing::info!(
        "read {} answer sheets ({} answer columns) from {}",
        rows.len(),
        answer_cols.len(),
        path.display()
    );
    Ok(rows)
}
