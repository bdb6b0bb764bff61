//! The persisted adjusted result store and identity mapping.

use std::path::Path;

use anyhow::{Context, Result};

use gradesync_core::model::{AdjustedResult, IdentityMapping};

use crate::atomic;
use crate::error::InputError;

/// Result store file name inside the output directory.
pub const FINAL_MARKS_FILE: &str = "final_marks.csv";

/// Persisted identity mapping next to the store.
pub const IDENTITY_MAP_FILE: &str = "identity_map.json";

pub const STORE_HEADER: [&str; 9] = [
    "student_id",
    "student_name",
    "model_id",
    "score",
    "max_score",
    "correct_count",
    "incorrect_count",
    "na_count",
    "mark",
];

/// Results read back from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedStore {
    pub results: Vec<AdjustedResult>,
    /// Rows dropped because a numeric field did not parse.
    pub dropped_rows: usize,
}

/// Replace the store with `results`, in order.
pub fn save_results(path: &Path, results: &[AdjustedResult]) -> Result<()> {
    atomic::write_with(path, |tx| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tx);
        writer.write_record(STORE_HEADER)?;
        for result in results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    })
    .with_context(|| format!("failed to write result store {}", path.display()))?;
    tracing::info!("saved {} results to {}", results.len(), path.display());
    Ok(())
}

/// Load the store, dropping rows with non-numeric fields.
pub fn load_results(path: &Path) -> Result<LoadedStore> {
    if !path.exists() {
        return Err(InputError::MissingFile(path.to_path_buf()).into());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let mut columns = [0usize; 9];
    for (slot, name) in columns.iter_mut().zip(STORE_HEADER) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| InputError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })?;
    }
    let [id, name, model, score, max, correct, incorrect, na, mark] = columns;

    let mut loaded = LoadedStore::default();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;
        let text = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

        let parsed = (|| {
            Some(AdjustedResult {
                student_id: text(id).to_string(),
                student_name: Some(text(name))
                    .filter(|n| !n.is_empty())
                    .map(String::from),
                model_id: text(model).to_string(),
                score: parse_finite(text(score))?,
                max_score: text(max).parse().ok()?,
                correct_count: text(correct).parse().ok()?,
                incorrect_count: text(incorrect).parse().ok()?,
                na_count: text(na).parse().ok()?,
                mark: parse_finite(text(mark))?,
            })
        })();

        match parsed {
            Some(result) => loaded.results.push(result),
            None => {
                tracing::warn!(
                    "dropping row {} of {}: non-numeric score field",
                    line + 2,
                    path.display()
                );
                loaded.dropped_rows += 1;
            }
        }
    }

    if loaded.dropped_rows > 0 {
        tracing::warn!(
            "{} row(s) of {} were dropped",
            loaded.dropped_rows,
            path.display()
        );
    }
    Ok(loaded)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load the identity mapping, or an empty one when none was saved yet.
pub fn load_identity_map(path: &Path) -> Result<IdentityMapping> {
    if !path.exists() {
        return Ok(IdentityMapping::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read identity map from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse identity map JSON")
}

pub fn save_identity_map(path: &Path, mapping: &IdentityMapping) -> Result<()> {
    let json = serde_json::to_string_pretty(mapping).context("failed to serialize identity map")?;
    atomic::write_bytes(path, json.as_bytes())
}
