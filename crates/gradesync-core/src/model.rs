//! Core data model types for gradesync.
//!
//! Solutions are loaded once per grading session and never mutated; answer
//! rows come from the upstream detection step; adjusted results are
//! regenerated wholesale on every analysis run.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SolutionError;

/// Question identifier, unique within one exam model.
pub type QuestionId = u32;

/// One selectable option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Display text of the option.
    #[serde(default)]
    pub text: String,
}

/// A multiple-choice question as it appears in one exam model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Position-based id within the model (1..N after shuffling).
    pub id: QuestionId,
    /// The id this question had before it was shuffled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<QuestionId>,
    /// Question statement.
    #[serde(default)]
    pub text: String,
    /// Ordered options; option `i` corresponds to answer letter `'A' + i`.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Index of the correct option. Absent for survey items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<usize>,
}

/// How a question participates in grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKey {
    /// The option at `correct` is the right answer.
    Graded { correct: usize },
    /// No correct answer exists; the question is never scored.
    Ungraded,
}

impl Question {
    /// The grading key of this question.
    pub fn key(&self) -> AnswerKey {
        match self.correct_answer_index {
            Some(correct) => AnswerKey::Graded { correct },
            None => AnswerKey::Ungraded,
        }
    }

    pub fn is_gradable(&self) -> bool {
        matches!(self.key(), AnswerKey::Graded { .. })
    }
}

/// One exam model: question id → question, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionModel {
    id: String,
    questions: BTreeMap<QuestionId, Question>,
}

impl SolutionModel {
    /// Build a model, enforcing unique ids and in-range answer indices.
    pub fn new(
        id: impl Into<String>,
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<Self, SolutionError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SolutionError::EmptyModelId);
        }

        let mut by_id = BTreeMap::new();
        for question in questions {
            if let AnswerKey::Graded { correct } = question.key() {
                if correct >= question.options.len() {
                    return Err(SolutionError::AnswerOutOfRange {
                        model: id,
                        question: question.id,
                        index: correct,
                        options: question.options.len(),
                    });
                }
            }
            let qid = question.id;
            if by_id.insert(qid, question).is_some() {
                return Err(SolutionError::DuplicateQuestion {
                    model: id,
                    question: qid,
                });
            }
        }

        Ok(Self {
            id,
            questions: by_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// All questions in ascending id order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Number of questions that carry a correct answer.
    pub fn gradable_count(&self) -> usize {
        self.questions.values().filter(|q| q.is_gradable()).count()
    }

    /// Ids of questions without a correct answer (surveys).
    pub fn ungraded_ids(&self) -> Vec<QuestionId> {
        self.questions
            .values()
            .filter(|q| !q.is_gradable())
            .map(|q| q.id)
            .collect()
    }
}

/// All exam models of a grading session, keyed by model id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionStore {
    models: BTreeMap<String, SolutionModel>,
}

impl SolutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model, replacing any previous model with the same id.
    pub fn insert(&mut self, model: SolutionModel) -> Option<SolutionModel> {
        self.models.insert(model.id.clone(), model)
    }

    pub fn get(&self, model_id: &str) -> Option<&SolutionModel> {
        self.models.get(model_id)
    }

    pub fn models(&self) -> impl Iterator<Item = &SolutionModel> {
        self.models.values()
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Largest gradable question count over all models.
    pub fn max_gradable(&self) -> usize {
        self.models
            .values()
            .map(SolutionModel::gradable_count)
            .max()
            .unwrap_or(0)
    }
}

/// A single answer cell of a detected sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerValue {
    /// A filled bubble, stored as an uppercase letter.
    Marked(char),
    /// The literal `NA` marker, an empty cell, or anything unreadable.
    Unanswered,
}

impl AnswerValue {
    /// Marker written by the detection step for an empty answer row.
    pub const NA_MARKER: &'static str = "NA";

    /// Parse a raw cell. Anything but a single ASCII letter is unanswered.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(Self::NA_MARKER) {
            return AnswerValue::Unanswered;
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                AnswerValue::Marked(c.to_ascii_uppercase())
            }
            _ => AnswerValue::Unanswered,
        }
    }

    /// Zero-based option index for a marked letter.
    pub fn option_index(&self) -> Option<usize> {
        match self {
            AnswerValue::Marked(c) if c.is_ascii_alphabetic() => {
                Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Marked(c) => write!(f, "{c}"),
            AnswerValue::Unanswered => f.write_str(Self::NA_MARKER),
        }
    }
}

/// One detected answer sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAnswerRow {
    /// Identifier as read by detection; may be noisy.
    pub detected_id: String,
    /// Student name, when the sheet source provides one.
    #[serde(default)]
    pub name: Option<String>,
    /// Exam model the sheet was printed from.
    pub model_id: String,
    /// Answers by question id. Missing entries count as unanswered.
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, AnswerValue>,
}

impl StudentAnswerRow {
    pub fn answer(&self, question: QuestionId) -> AnswerValue {
        self.answers
            .get(&question)
            .copied()
            .unwrap_or(AnswerValue::Unanswered)
    }
}

/// The graded outcome for one answer sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedResult {
    /// Detected id, or the canonical roster id once reconciled.
    pub student_id: String,
    /// Roster name once reconciled.
    #[serde(default)]
    pub student_name: Option<String>,
    pub model_id: String,
    /// Adjusted score; fractional under a penalty.
    pub score: f64,
    pub max_score: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub na_count: u32,
    /// Score rescaled to 0–10.
    pub mark: f64,
}

/// One row of the authoritative roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Identifier exactly as it appears in the roster file.
    pub roster_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Filled by reconciliation; cleared at the start of every run.
    #[serde(default)]
    pub mark: Option<f64>,
}

/// The roster identity a detected id was reconciled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Detected id → canonical roster identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMapping {
    entries: BTreeMap<String, CanonicalIdentity>,
}

impl IdentityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, detected_id: impl Into<String>, identity: CanonicalIdentity) {
        self.entries.insert(detected_id.into(), identity);
    }

    pub fn get(&self, detected_id: &str) -> Option<&CanonicalIdentity> {
        self.entries.get(detected_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CanonicalIdentity)> {
        self.entries.iter()
    }

    /// Rewrite result identities in place.
    ///
    /// Returns the number of mapping entries that matched at least one row.
    pub fn apply(&self, results: &mut [AdjustedResult]) -> usize {
        let mut hits: HashSet<&str> = HashSet::new();
        for result in results.iter_mut() {
            let key = crate::matching::normalize_id(&result.student_id);
            if let Some((detected, identity)) = self.entries.get_key_value(key.as_str()) {
                result.student_id = identity.id.clone();
                if let Some(name) = &identity.name {
                    result.student_name = Some(name.clone());
                }
                hits.insert(detected.as_str());
            }
        }
        hits.len()
    }

    /// Fold a newer mapping into this one.
    ///
    /// Older entries whose canonical id was re-mapped by `newer` follow the
    /// new target, so a detected id never needs more than one lookup.
    pub fn absorb(&mut self, newer: &IdentityMapping) {
        for identity in self.entries.values_mut() {
            if let Some(next) = newer.entries.get(&identity.id) {
                *identity = next.clone();
            }
        }
        for (detected, identity) in &newer.entries {
            self.entries.insert(detected.clone(), identity.clone());
        }
    }
}
