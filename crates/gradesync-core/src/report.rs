//! Grading and reconciliation reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::atomic;
use crate::matching::{MatchCandidate, MatchOutcome, MatchedPair};
use crate::merge::MergeSummary;
use crate::model::AdjustedResult;
use crate::scoring::VoidPolicy;
use crate::statistics::{mark_histogram, MarkStatistics};

/// Counts of input problems that were tolerated rather than fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Answer rows whose model id has no solution.
    pub unknown_model_rows: usize,
    /// Questions skipped because they carry no correct answer.
    pub ungraded_questions: usize,
    /// Store rows dropped for non-numeric fields.
    pub dropped_store_rows: usize,
    pub duplicate_roster_ids: usize,
    pub duplicate_detected_ids: usize,
}

impl DataQuality {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// The outcome of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Model ids the solutions were loaded for.
    pub models: Vec<String>,
    /// Largest gradable question count over all models.
    pub nominal_max_score: usize,
    pub policy: VoidPolicy,
    pub statistics: Option<MarkStatistics>,
    /// Mark counts per integer bin 0..=10.
    pub histogram: Vec<usize>,
    pub data_quality: DataQuality,
    pub results: Vec<AdjustedResult>,
}

impl GradingReport {
    pub fn new(
        models: Vec<String>,
        nominal_max_score: usize,
        policy: VoidPolicy,
        results: Vec<AdjustedResult>,
        data_quality: DataQuality,
    ) -> Self {
        let marks: Vec<f64> = results.iter().map(|r| r.mark).collect();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            models,
            nominal_max_score,
            policy,
            statistics: MarkStatistics::from_marks(&marks),
            histogram: mark_histogram(&marks).to_vec(),
            data_quality,
            results,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "grading report")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "grading report")
    }

    /// Render a short Markdown summary.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Grading Report\n\n");
        md.push_str(&format!(
            "**Students:** {} | **Models:** {} | **Max score:** {}\n\n",
            self.results.len(),
            self.models.join(", "),
            self.nominal_max_score
        ));
        if let Some(stats) = &self.statistics {
            md.push_str("| Mean | Std | Min | Q1 | Median | Q3 | Max |\n");
            md.push_str("|------|-----|-----|----|--------|----|-----|\n");
            let std = stats
                .std_dev
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "-".into());
            md.push_str(&format!(
                "| {:.2} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n\n",
                stats.mean, std, stats.min, stats.q1, stats.median, stats.q3, stats.max
            ));
        }
        if !self.data_quality.is_clean() {
            let dq = &self.data_quality;
            md.push_str("## Data Quality\n\n");
            md.push_str(&format!("- Unknown model rows: {}\n", dq.unknown_model_rows));
            md.push_str(&format!("- Ungraded questions: {}\n", dq.ungraded_questions));
            md.push_str(&format!("- Dropped store rows: {}\n", dq.dropped_store_rows));
        }
        md
    }
}

/// The outcome of one roster fill run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub threshold: f64,
    pub pairs: Vec<MatchedPair>,
    pub marked_rows: usize,
    pub unmatched_roster: Vec<String>,
    pub unmatched_detected: Vec<String>,
    pub near_misses: Vec<MatchCandidate>,
    pub data_quality: DataQuality,
}

impl ReconciliationReport {
    pub fn new(threshold: f64, outcome: &MatchOutcome, summary: &MergeSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            threshold,
            pairs: outcome.pairs.clone(),
            marked_rows: summary.marked_rows,
            unmatched_roster: summary.unmatched_roster.clone(),
            unmatched_detected: summary.unmatched_detected.clone(),
            near_misses: outcome.near_misses.clone(),
            data_quality: DataQuality {
                duplicate_roster_ids: outcome.duplicate_roster_ids,
                duplicate_detected_ids: outcome.duplicate_detected_ids,
                ..Default::default()
            },
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "reconciliation report")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "reconciliation report")
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))?;
    atomic::write_bytes(path, json.as_bytes())
        .with_context(|| format!("failed to write {what} to {}", path.display()))
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {what} JSON"))
}
