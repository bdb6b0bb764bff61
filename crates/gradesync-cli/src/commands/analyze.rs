//! The `gradesync analyze` command.

use std::path::Path;

use anyhow::{Context, Result};

use gradesync_core::report::{DataQuality, GradingReport};
use gradesync_core::scoring::ScoreAdjuster;
use gradesync_io::config::GradeConfig;
use gradesync_io::atomic;
use gradesync_io::store::{self, FINAL_MARKS_FILE, IDENTITY_MAP_FILE};
use gradesync_io::{answers, solutions};

use super::{GRADING_REPORT_FILE, GRADING_SUMMARY_FILE};
use crate::output;

pub fn execute(
    config: &GradeConfig,
    exam_dir: &Path,
    answers_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    let policy = config.policy.void_policy()?;
    let solution_store = solutions::load_solutions(exam_dir)
        .with_context(|| format!("failed to load solutions from {}", exam_dir.display()))?;
    let rows = answers::read_answers(answers_path)
        .with_context(|| format!("failed to load answers from {}", answers_path.display()))?;

    let ungraded_questions: usize = solution_store.models().map(|m| m.ungraded_ids().len()).sum();
    for model in solution_store.models() {
        let ungraded = model.ungraded_ids();
        if !ungraded.is_empty() {
            tracing::warn!(
                "model '{}': questions {:?} have no correct answer and are not graded",
                model.id(),
                ungraded
            );
        }
    }

    let adjuster = ScoreAdjuster::new(&solution_store, &policy);
    let mut batch = adjuster.grade_all(&rows);

    let mapping = store::load_identity_map(&output_dir.join(IDENTITY_MAP_FILE))?;
    if !mapping.is_empty() {
        let applied = mapping.apply(&mut batch.results);
        tracing::info!("applied {applied} saved identity mapping(s)");
    }

    store::save_results(&output_dir.join(FINAL_MARKS_FILE), &batch.results)?;

    let data_quality = DataQuality {
        unknown_model_rows: batch.unknown_model_rows,
        ungraded_questions,
        ..Default::default()
    };
    let report = GradingReport::new(
        solution_store.model_ids(),
        solution_store.max_gradable(),
        policy,
        batch.results,
        data_quality,
    );
    let report_path = output_dir.join(GRADING_REPORT_FILE);
    report
        .save_json(&report_path)
        .with_context(|| format!("failed to save {}", report_path.display()))?;
    atomic::write_bytes(&output_dir.join(GRADING_SUMMARY_FILE), report.to_markdown().as_bytes())?;

    output::print_statistics(report.statistics.as_ref(), report.nominal_max_score);
    output::print_histogram(&report.histogram);
    output::print_marks("Student Marks", &report.results);

    if report.data_quality.unknown_model_rows > 0 {
        println!(
            "\n{} answer sheet(s) used an unknown model and scored 0.",
            report.data_quality.unknown_model_rows
        );
    }
    println!(
        "\nSaved {} results to {}",
        report.results.len(),
        output_dir.join(FINAL_MARKS_FILE).display()
    );
    Ok(())
}
