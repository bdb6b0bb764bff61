//! The `gradesync fill-marks` command.

use std::path::Path;

use anyhow::{Context, Result};

use gradesync_core::merge::RosterMerger;
use gradesync_core::report::ReconciliationReport;
use gradesync_io::config::GradeConfig;
use gradesync_io::roster::{self, RosterTable};
use gradesync_io::store::{self, FINAL_MARKS_FILE, IDENTITY_MAP_FILE};

use super::RECONCILIATION_REPORT_FILE;
use crate::output;

pub fn execute(config: &GradeConfig, roster_path: &Path, output_dir: &Path) -> Result<()> {
    let options = config.roster.options()?;
    let matcher = config.matching.matcher()?;

    let store_path = output_dir.join(FINAL_MARKS_FILE);
    let loaded = store::load_results(&store_path).with_context(|| {
        format!(
            "no result store at {}; run `gradesync analyze` first",
            store_path.display()
        )
    })?;

    let mut table = RosterTable::read(roster_path, &options)
        .with_context(|| format!("failed to load roster {}", roster_path.display()))?;
    let mut entries = table.entries(&options)?;

    let roster_ids: Vec<&str> = entries.iter().map(|e| e.roster_id.as_str()).collect();
    let detected_ids: Vec<&str> = loaded.results.iter().map(|r| r.student_id.as_str()).collect();
    let outcome = matcher.match_ids(&roster_ids, &detected_ids);

    let summary = RosterMerger::new(&loaded.results).merge(&mut entries, &outcome);

    table.set_marks(&options.mark_column, &entries);
    if options.simplify {
        table.simplify(&options);
    }
    let output_path = roster::output_path(roster_path)?;
    table.write(&output_path, &options)?;
    println!(
        "Saved marks to {}. Matched {}/{} students.",
        output_path.display(),
        outcome.pairs.len(),
        entries.len()
    );
    if outcome.fuzzy_count() > 0 {
        println!(
            "{} exact and {} fuzzy match(es).",
            outcome.exact_count(),
            outcome.fuzzy_count()
        );
    }

    if !summary.unmatched_detected.is_empty() {
        tracing::warn!(
            "Tip: lower the fuzzy threshold or correct the detected ids in {}",
            store_path.display()
        );
    }

    let mut results = loaded.results.clone();
    let updated = summary.mapping.apply(&mut results);
    if updated > 0 {
        store::save_results(&store_path, &results)?;
        tracing::info!("updated {updated} student id(s) in {}", store_path.display());
    }

    let map_path = output_dir.join(IDENTITY_MAP_FILE);
    let mut mapping = store::load_identity_map(&map_path)?;
    mapping.absorb(&summary.mapping);
    store::save_identity_map(&map_path, &mapping)?;

    let mut report = ReconciliationReport::new(matcher.threshold(), &outcome, &summary);
    report.data_quality.dropped_store_rows = loaded.dropped_rows;
    let report_path = output_dir.join(RECONCILIATION_REPORT_FILE);
    report
        .save_json(&report_path)
        .with_context(|| format!("failed to save {}", report_path.display()))?;

    output::print_marks("Student Marks (Updated from Roster)", &results);
    if !summary.unmatched_roster.is_empty() {
        println!("\nUnmatched roster ids: {}", summary.unmatched_roster.join(", "));
    }
    if !summary.unmatched_detected.is_empty() {
        println!("Unmatched detected ids: {}", summary.unmatched_detected.join(", "));
    }
    Ok(())
}
