//! Score adjustment under a void/penalty policy, and mark scaling.
//!
//! The adjuster walks a model's questions in ascending id order and applies,
//! per question, exactly one treatment:
//!
//! | treatment    | correct            | incorrect              | unanswered |
//! |--------------|--------------------|------------------------|------------|
//! | ungraded     | skipped            | skipped                | skipped    |
//! | void         | skipped            | skipped                | skipped    |
//! | void nicely  | +1 score, +1 max   | no effect              | no effect  |
//! | normal       | +1 score, +1 max   | -penalty, +1 max       | +1 max     |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    AdjustedResult, AnswerKey, AnswerValue, QuestionId, SolutionModel, SolutionStore,
    StudentAnswerRow,
};

/// Upper bound of the mark scale.
pub const MAX_MARK: f64 = 10.0;

/// Which questions are voided and how wrong answers are penalised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoidPolicy {
    /// Removed from scoring and from the denominator for everyone.
    #[serde(default)]
    pub void: BTreeSet<QuestionId>,
    /// Counted only for students who answered them correctly.
    #[serde(default)]
    pub void_nicely: BTreeSet<QuestionId>,
    /// Points subtracted per attempted wrong answer. Applied as given.
    #[serde(default)]
    pub penalty: f64,
}

/// Per-question treatment derived from a [`VoidPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    Void,
    VoidNicely,
    Normal,
}

impl VoidPolicy {
    pub fn new(
        void: impl IntoIterator<Item = QuestionId>,
        void_nicely: impl IntoIterator<Item = QuestionId>,
        penalty: f64,
    ) -> Self {
        Self {
            void: void.into_iter().collect(),
            void_nicely: void_nicely.into_iter().collect(),
            penalty,
        }
    }

    /// Full void is checked first, so it wins when a question is in both sets.
    pub fn treatment(&self, question: QuestionId) -> Treatment {
        if self.void.contains(&question) {
            Treatment::Void
        } else if self.void_nicely.contains(&question) {
            Treatment::VoidNicely
        } else {
            Treatment::Normal
        }
    }

    /// Question ids listed in both the void and the void-nicely set.
    pub fn overlap(&self) -> Vec<QuestionId> {
        self.void.intersection(&self.void_nicely).copied().collect()
    }
}

/// Raw outcome of adjusting one answer sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub max_score: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub na_count: u32,
}

impl ScoreBreakdown {
    /// Mark on the 0–10 scale.
    pub fn mark(&self) -> f64 {
        scale_mark(self.score, self.max_score)
    }
}

/// Map `(score, max)` onto `[0, 10]`.
///
/// A zero denominator yields 0, and so does any non-finite intermediate.
pub fn scale_mark(score: f64, max_score: u32) -> f64 {
    if max_score == 0 {
        return 0.0;
    }
    let mark = score / f64::from(max_score) * MAX_MARK;
    if mark.is_finite() {
        mark.clamp(0.0, MAX_MARK)
    } else {
        0.0
    }
}

/// Round a mark to two decimals for export.
pub fn round_mark(mark: f64) -> f64 {
    (mark * 100.0).round() / 100.0
}

/// Result of grading a batch of answer sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradedBatch {
    /// One result per input row, in input order.
    pub results: Vec<AdjustedResult>,
    /// Rows whose model id is unknown; they were scored 0/0.
    pub unknown_model_rows: usize,
}

/// Applies a [`VoidPolicy`] to answer sheets using a [`SolutionStore`].
pub struct ScoreAdjuster<'a> {
    store: &'a SolutionStore,
    policy: &'a VoidPolicy,
}

impl<'a> ScoreAdjuster<'a> {
    pub fn new(store: &'a SolutionStore, policy: &'a VoidPolicy) -> Self {
        let overlap = policy.overlap();
        if !overlap.is_empty() {
            tracing::warn!(
                "questions {overlap:?} are both voided and voided nicely; full void applies"
            );
        }
        Self { store, policy }
    }

    /// Adjust a single sheet. Unknown models score 0/0 with all counts 0.
    pub fn adjust(&self, row: &StudentAnswerRow) -> ScoreBreakdown {
        match self.store.get(&row.model_id) {
            Some(model) => adjust_against(model, row, self.policy),
            None => ScoreBreakdown::default(),
        }
    }

    /// Grade every row independently, preserving input order.
    pub fn grade_all(&self, rows: &[StudentAnswerRow]) -> GradedBatch {
        let mut unknown_model_rows = 0;
        let results = rows
            .iter()
            .map(|row| {
                if self.store.get(&row.model_id).is_none() {
                    tracing::warn!(
                        "student '{}' uses unknown model '{}'; scored 0/0",
                        row.detected_id,
                        row.model_id
                    );
                    unknown_model_rows += 1;
                }
                let breakdown = self.adjust(row);
                AdjustedResult {
                    student_id: row.detected_id.clone(),
                    student_name: row.name.clone(),
                    model_id: row.model_id.clone(),
                    score: breakdown.score,
                    max_score: breakdown.max_score,
                    correct_count: breakdown.correct_count,
                    incorrect_count: breakdown.incorrect_count,
                    na_count: breakdown.na_count,
                    mark: breakdown.mark(),
                }
            })
            .collect();

        GradedBatch {
            results,
            unknown_model_rows,
        }
    }
}

fn adjust_against(
    model: &SolutionModel,
    row: &StudentAnswerRow,
    policy: &VoidPolicy,
) -> ScoreBreakdown {
    let mut out = ScoreBreakdown::default();

    for question in model.questions() {
        let AnswerKey::Graded { correct } = question.key() else {
            continue;
        };
        let answer = row.answer(question.id);
        let is_correct = answer.option_index() == Some(correct);

        match policy.treatment(question.id) {
            Treatment::Void => {}
            Treatment::VoidNicely => {
                if is_correct {
                    out.max_score += 1;
                    out.score += 1.0;
                    out.correct_count += 1;
                }
            }
            Treatment::Normal => {
                out.max_score += 1;
                match answer {
                    _ if is_correct => {
                        out.score += 1.0;
                        out.correct_count += 1;
                    }
                    AnswerValue::Marked(_) => {
                        out.score -= policy.penalty;
                        out.incorrect_count += 1;
                    }
                    AnswerValue::Unanswered => {
                        out.na_count += 1;
                    }
                }
            }
        }
    }

    out
}
