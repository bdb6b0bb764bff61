//! Input error types.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the inputs of a run. Each aborts before anything is written.
#[derive(Debug, Error)]
pub enum InputError {
    /// A required input file does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The file extension is not one of the supported formats.
    #[error("unsupported file format '{extension}': {}", path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// A required column is absent from a tabular file.
    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A data row carries values past the last header column.
    #[error("row {row} of {} has {fields} fields but the header has {columns}", path.display())]
    ExtraFields {
        path: PathBuf,
        row: usize,
        fields: usize,
        columns: usize,
    },

    /// No exam model solution files were found.
    #[error("no exam_model_*_questions.json files found in {}", .0.display())]
    NoSolutions(PathBuf),

    /// A setting needed by the command was not provided.
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid field separator '{0}' (expected a single character or one of semi, comma, tab, pipe)")]
    InvalidSeparator(String),

    #[error("invalid decimal separator '{0}' (expected a single character)")]
    InvalidDecimalSeparator(String),

    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("penalty must be a finite number, got {0}")]
    InvalidPenalty(f64),

    #[error("fuzzy threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f64),
}
