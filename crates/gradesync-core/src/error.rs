//! Error types for the grading core.

use thiserror::Error;

use crate::model::QuestionId;

/// Violations of the solution model invariants.
#[derive(Debug, Error, PartialEq)]
pub enum SolutionError {
    /// Two questions in the same model share an id.
    #[error("model '{model}': duplicate question id {question}")]
    DuplicateQuestion { model: String, question: QuestionId },

    /// The correct answer index does not address one of the options.
    #[error("model '{model}': question {question} has correct answer index {index} but only {options} option(s)")]
    AnswerOutOfRange {
        model: String,
        question: QuestionId,
        index: usize,
        options: usize,
    },

    /// A model id was empty.
    #[error("model id must not be empty")]
    EmptyModelId,
}

/// Errors raised when configuring the identity matcher.
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// Similarity thresholds live on a 0–100 scale.
    #[error("similarity threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f64),
}
