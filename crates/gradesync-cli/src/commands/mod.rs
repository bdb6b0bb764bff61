pub mod analyze;
pub mod fill_marks;
pub mod grade;
pub mod init;
pub mod shuffle;
pub mod validate;

/// Grading report file written by `analyze`.
pub const GRADING_REPORT_FILE: &str = "grading_report.json";

/// Markdown summary written next to the grading report.
pub const GRADING_SUMMARY_FILE: &str = "grading_report.md";

/// Reconciliation report file written by `fill-marks`.
pub const RECONCILIATION_REPORT_FILE: &str = "reconciliation_report.json";
