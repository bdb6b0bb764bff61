//! Writing matched marks into the roster and building the identity mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::matching::{normalize_id, MatchOutcome};
use crate::model::{AdjustedResult, CanonicalIdentity, IdentityMapping, RosterEntry};
use crate::scoring::round_mark;

/// What a merge changed and what it could not place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Roster rows that received a mark.
    pub marked_rows: usize,
    /// Detected id → roster identity for every accepted pair.
    pub mapping: IdentityMapping,
    /// Raw roster ids of non-blank rows left without a mark.
    pub unmatched_roster: Vec<String>,
    /// Detected ids no roster row claimed.
    pub unmatched_detected: Vec<String>,
}

/// Merges a [`MatchOutcome`] into roster entries.
pub struct RosterMerger<'a> {
    by_detected: HashMap<String, &'a AdjustedResult>,
}

impl<'a> RosterMerger<'a> {
    /// Index results by normalized id. The first result for an id wins.
    pub fn new(results: &'a [AdjustedResult]) -> Self {
        let mut by_detected = HashMap::with_capacity(results.len());
        for result in results {
            by_detected
                .entry(normalize_id(&result.student_id))
                .or_insert(result);
        }
        Self { by_detected }
    }

    /// Clear every mark slot, then fill the rows of each accepted pair.
    ///
    /// Marks are rounded to two decimals. Every roster row sharing a matched
    /// id receives the mark; the first such row provides the name.
    pub fn merge(&self, roster: &mut [RosterEntry], outcome: &MatchOutcome) -> MergeSummary {
        for entry in roster.iter_mut() {
            entry.mark = None;
        }

        let mut rows_by_id: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in roster.iter().enumerate() {
            rows_by_id
                .entry(normalize_id(&entry.roster_id))
                .or_default()
                .push(idx);
        }

        let mut summary = MergeSummary {
            unmatched_detected: outcome.unmatched_detected.clone(),
            ..Default::default()
        };

        for pair in &outcome.pairs {
            let Some(result) = self.by_detected.get(&pair.detected_id) else {
                tracing::warn!(
                    "matched detected id '{}' has no adjusted result; skipping",
                    pair.detected_id
                );
                continue;
            };
            let Some(rows) = rows_by_id.get(&pair.roster_id) else {
                continue;
            };

            let mark = round_mark(result.mark);
            for &idx in rows {
                roster[idx].mark = Some(mark);
                summary.marked_rows += 1;
            }
            let name = rows
                .first()
                .and_then(|&idx| roster[idx].name.clone())
                .filter(|n| !n.trim().is_empty());
            summary.mapping.insert(
                pair.detected_id.clone(),
                CanonicalIdentity {
                    id: pair.roster_id.clone(),
                    name,
                },
            );
        }

        summary.unmatched_roster = roster
            .iter()
            .filter(|e| !e.roster_id.trim().is_empty() && e.mark.is_none())
            .map(|e| e.roster_id.clone())
            .collect();

        if !summary.unmatched_roster.is_empty() {
            tracing::warn!(
                "unmatched students from roster ({}): {:?}",
                summary.unmatched_roster.len(),
                summary.unmatched_roster
            );
        }
        if !summary.unmatched_detected.is_empty() {
            tracing::warn!(
                "unmatched exams from detection ({}): {:?}",
                summary.unmatched_detected.len(),
                summary.unmatched_detected
            );
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::IdentityMatcher;

    fn result(id: &str, mark: f64) -> AdjustedResult {
        AdjustedResult {
            student_id: id.into(),
            student_name: None,
            model_id: "1".into(),
            score: mark,
            max_score: 10,
            correct_count: mark as u32,
            incorrect_count: 0,
            na_count: 0,
            mark,
        }
    }

    fn entry(id: &str, name: Option<&str>) -> RosterEntry {
        RosterEntry {
            roster_id: id.into(),
            name: name.map(String::from),
            mark: Some(99.0),
        }
    }

    #[test]
    fn exact_match_copies_mark() {
        let results = vec![result("A123", 7.256)];
        let mut roster = vec![entry("A123", Some("Ada"))];
        let outcome = IdentityMatcher::exact_only().match_ids(&["A123"], &["A123"]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &outcome);

        assert_eq!(roster[0].mark, Some(7.26));
        assert_eq!(summary.marked_rows, 1);
        let identity = summary.mapping.get("A123").unwrap();
        assert_eq!(identity.id, "A123");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn fuzzy_match_maps_detected_to_roster_identity() {
        let results = vec![result("a12b", 5.5)];
        let mut roster = vec![entry(" a123", Some("Ada")), entry("Z999", None)];
        let outcome = IdentityMatcher::new(75.0)
            .unwrap()
            .match_ids(&[" a123", "Z999"], &["a12b"]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &outcome);

        assert_eq!(roster[0].mark, Some(5.5));
        assert_eq!(roster[1].mark, None);
        assert_eq!(summary.unmatched_roster, vec!["Z999"]);
        assert!(summary.unmatched_detected.is_empty());
        assert_eq!(summary.mapping.get("A12B").unwrap().id, "A123");
    }

    #[test]
    fn stale_marks_are_cleared() {
        let results = vec![result("B1", 4.0)];
        let mut roster = vec![entry("A1", None)];
        let outcome = IdentityMatcher::exact_only().match_ids(&["A1"], &["B1"]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &outcome);
        assert_eq!(roster[0].mark, None);
        assert_eq!(summary.unmatched_roster, vec!["A1"]);
        assert_eq!(summary.unmatched_detected, vec!["B1"]);
        assert!(summary.mapping.is_empty());
    }

    #[test]
    fn duplicate_roster_rows_share_the_mark() {
        let results = vec![result("A1", 8.0)];
        let mut roster = vec![entry("A1", Some("First")), entry("a1", Some("Second"))];
        let outcome = IdentityMatcher::exact_only().match_ids(&["A1", "a1"], &["A1"]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &outcome);
        assert_eq!(summary.marked_rows, 2);
        assert!(roster.iter().all(|e| e.mark == Some(8.0)));
        assert_eq!(summary.mapping.get("A1").unwrap().name.as_deref(), Some("First"));
    }

    #[test]
    fn blank_roster_rows_are_not_reported() {
        let results: Vec<AdjustedResult> = vec![];
        let mut roster = vec![entry("  ", None)];
        let outcome = IdentityMatcher::exact_only().match_ids(&["  "], &[] as &[&str]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &outcome);
        assert!(summary.unmatched_roster.is_empty());
    }

    #[test]
    fn back_propagated_identity_turns_rerun_into_exact_match() {
        let mut results = vec![result("A12B", 6.0)];
        let mut roster = vec![entry("A123", Some("Ada"))];
        let matcher = IdentityMatcher::new(70.0).unwrap();

        let first = matcher.match_ids(&["A123"], &["A12B"]);
        let summary = RosterMerger::new(&results).merge(&mut roster, &first);
        assert_eq!(summary.mapping.apply(&mut results), 1);
        assert_eq!(results[0].student_id, "A123");
        assert_eq!(results[0].student_name.as_deref(), Some("Ada"));

        let second = matcher.match_ids(&["A123"], &["A123"]);
        assert_eq!(second.exact_count(), 1);
        RosterMerger::new(&results).merge(&mut roster, &second);
        assert_eq!(roster[0].mark, Some(6.0));
    }
}
