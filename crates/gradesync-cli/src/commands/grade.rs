//! The `gradesync grade` command.

use std::path::Path;

use anyhow::Result;

use gradesync_io::config::GradeConfig;

pub fn execute(
    config: &GradeConfig,
    exam_dir: &Path,
    answers_path: &Path,
    output_dir: &Path,
    roster: Option<&Path>,
) -> Result<()> {
    super::analyze::execute(config, exam_dir, answers_path, output_dir)?;
    match roster {
        Some(roster) => super::fill_marks::execute(config, roster, output_dir),
        None => {
            tracing::info!("no roster given; skipping mark filling");
            Ok(())
        }
    }
}
