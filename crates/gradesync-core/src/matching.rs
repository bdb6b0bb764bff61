//! Identity reconciliation between roster ids and detected ids.
//!
//! Matching runs in two phases. The exact phase is a set intersection and
//! always runs. The fuzzy phase (threshold below 100) ranks every remaining
//! roster/detected pair by similarity and assigns greedily, so each id is
//! consumed at most once.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Similarity value meaning "identical strings"; as a threshold it
/// disables the fuzzy phase.
pub const EXACT_ONLY: f64 = 100.0;

/// Unmatched candidates scoring above this are reported as near misses.
pub const NEAR_MISS_FLOOR: f64 = 40.0;

/// Canonical form used for comparison: trimmed and uppercased.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// InDel ratio `(|a| + |b| - indel) / (|a| + |b|)` on a 0–100 scale.
///
/// Insertions and deletions cost one and substitutions two, so a dropped
/// character costs less than a wrong one. Two empty ids are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return EXACT_ONLY;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// A scored roster/detected pair considered by the fuzzy phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub similarity: f64,
    pub roster_id: String,
    pub detected_id: String,
}

impl MatchCandidate {
    /// Similarity descending, then roster id, then detected id ascending.
    fn rank_order(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.roster_id.cmp(&other.roster_id))
            .then_with(|| self.detected_id.cmp(&other.detected_id))
    }
}

/// Candidates in rank order. Construction sorts, so the early stop at the
/// threshold boundary is always sound.
#[derive(Debug)]
struct RankedCandidates(Vec<MatchCandidate>);

impl RankedCandidates {
    fn rank(mut candidates: Vec<MatchCandidate>) -> Self {
        candidates.sort_by(MatchCandidate::rank_order);
        Self(candidates)
    }

    /// Split into (at or above threshold, below threshold).
    fn split_at_threshold(&self, threshold: f64) -> (&[MatchCandidate], &[MatchCandidate]) {
        let boundary = self.0.partition_point(|c| c.similarity >= threshold);
        self.0.split_at(boundary)
    }
}

/// How an accepted pair was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// An accepted roster/detected pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub roster_id: String,
    pub detected_id: String,
    pub similarity: f64,
    pub kind: MatchKind,
}

/// Everything a matching run produced, including diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Exact pairs in roster order, then fuzzy pairs in acceptance order.
    pub pairs: Vec<MatchedPair>,
    /// Normalized roster ids left without a partner, in roster order.
    pub unmatched_roster: Vec<String>,
    /// Normalized detected ids never consumed, in input order.
    pub unmatched_detected: Vec<String>,
    /// Below-threshold candidates above [`NEAR_MISS_FLOOR`] whose sides both
    /// stayed unmatched.
    pub near_misses: Vec<MatchCandidate>,
    pub duplicate_roster_ids: usize,
    pub duplicate_detected_ids: usize,
}

impl MatchOutcome {
    pub fn exact_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.kind == MatchKind::Exact).count()
    }

    pub fn fuzzy_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.kind == MatchKind::Fuzzy).count()
    }
}

/// Reconciles roster ids against detected ids.
#[derive(Debug, Clone, Copy)]
pub struct IdentityMatcher {
    threshold: f64,
}

impl IdentityMatcher {
    pub fn new(threshold: f64) -> Result<Self, MatchError> {
        if !(0.0..=EXACT_ONLY).contains(&threshold) {
            return Err(MatchError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn exact_only() -> Self {
        Self {
            threshold: EXACT_ONLY,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Match raw ids. Both sides are normalized; blanks are ignored.
    pub fn match_ids<R, D>(&self, roster: &[R], detected: &[D]) -> MatchOutcome
    where
        R: AsRef<str>,
        D: AsRef<str>,
    {
        let (roster, duplicate_roster_ids) = dedup_normalized(roster);
        let (detected, duplicate_detected_ids) = dedup_normalized(detected);
        if duplicate_roster_ids > 0 {
            tracing::warn!("{duplicate_roster_ids} duplicate roster id(s) ignored for matching");
        }
        if duplicate_detected_ids > 0 {
            tracing::warn!(
                "{duplicate_detected_ids} duplicate detected id(s) ignored for matching"
            );
        }

        let mut used_roster: HashSet<String> = HashSet::new();
        let mut used_detected: HashSet<String> = HashSet::new();
        let mut pairs = Vec::new();

        let detected_set: HashSet<&str> = detected.iter().map(String::as_str).collect();
        for id in &roster {
            if detected_set.contains(id.as_str()) {
                used_roster.insert(id.clone());
                used_detected.insert(id.clone());
                pairs.push(MatchedPair {
                    roster_id: id.clone(),
                    detected_id: id.clone(),
                    similarity: EXACT_ONLY,
                    kind: MatchKind::Exact,
                });
            }
        }
        if !pairs.is_empty() {
            tracing::info!("exact matched {} student(s) directly", pairs.len());
        }

        let mut near_misses = Vec::new();
        if self.threshold < EXACT_ONLY {
            let mut candidates = Vec::new();
            for r in roster.iter().filter(|r| !used_roster.contains(r.as_str())) {
                for d in detected.iter().filter(|d| !used_detected.contains(d.as_str())) {
                    candidates.push(MatchCandidate {
                        similarity: similarity(r, d),
                        roster_id: r.clone(),
                        detected_id: d.clone(),
                    });
                }
            }
            let ranked = RankedCandidates::rank(candidates);
            for c in &ranked.0 {
                tracing::debug!(
                    "candidate '{}' / '{}': {:.1}",
                    c.roster_id,
                    c.detected_id,
                    c.similarity
                );
            }
            let (acceptable, below) = ranked.split_at_threshold(self.threshold);

            for c in acceptable {
                if used_roster.contains(c.roster_id.as_str())
                    || used_detected.contains(c.detected_id.as_str())
                {
                    continue;
                }
                tracing::info!(
                    "fuzzy matched '{}' with detected id '{}' (score: {:.1}%)",
                    c.roster_id,
                    c.detected_id,
                    c.similarity
                );
                used_roster.insert(c.roster_id.clone());
                used_detected.insert(c.detected_id.clone());
                pairs.push(MatchedPair {
                    roster_id: c.roster_id.clone(),
                    detected_id: c.detected_id.clone(),
                    similarity: c.similarity,
                    kind: MatchKind::Fuzzy,
                });
            }

            tracing::info!("matching threshold: {}", self.threshold);
            for c in below {
                if c.similarity <= NEAR_MISS_FLOOR {
                    break;
                }
                if used_roster.contains(c.roster_id.as_str())
                    || used_detected.contains(c.detected_id.as_str())
                {
                    continue;
                }
                tracing::info!(
                    "skipped match '{}' with detected id '{}' (score: {:.1}%)",
                    c.roster_id,
                    c.detected_id,
                    c.similarity
                );
                near_misses.push(c.clone());
            }
            if near_misses.is_empty() {
                tracing::info!("no significant matches found below threshold");
            }
        }

        let unmatched_roster = roster
            .iter()
            .filter(|r| !used_roster.contains(r.as_str()))
            .cloned()
            .collect();
        let unmatched_detected = detected
            .iter()
            .filter(|d| !used_detected.contains(d.as_str()))
            .cloned()
            .collect();

        MatchOutcome {
            pairs,
            unmatched_roster,
            unmatched_detected,
            near_misses,
            duplicate_roster_ids,
            duplicate_detected_ids,
        }
    }
}

/// Normalize, drop blanks and keep the first occurrence of each id.
fn dedup_normalized<S: AsRef<str>>(ids: &[S]) -> (Vec<String>, usize) {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    let mut duplicates = 0;
    for raw in ids {
        let id = normalize_id(raw.as_ref());
        if id.is_empty() {
            continue;
        }
        if seen.insert(id.clone()) {
            out.push(id);
        } else {
            duplicates += 1;
        }
    }
    (out, duplicates)
}
