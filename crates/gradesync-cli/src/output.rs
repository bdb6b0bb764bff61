//! Terminal tables.

use comfy_table::{Cell, Table};

use gradesync_core::model::AdjustedResult;
use gradesync_core::scoring::round_mark;
use gradesync_core::statistics::MarkStatistics;

pub fn print_statistics(stats: Option<&MarkStatistics>, nominal_max_score: usize) {
    let Some(stats) = stats else {
        println!("No marks to summarize.");
        return;
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Students", "Max Score", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max",
    ]);
    table.add_row(vec![
        Cell::new(stats.count),
        Cell::new(nominal_max_score),
        Cell::new(format!("{:.2}", stats.mean)),
        Cell::new(
            stats
                .std_dev
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "-".into()),
        ),
        Cell::new(format!("{:.2}", stats.min)),
        Cell::new(format!("{:.2}", stats.q1)),
        Cell::new(format!("{:.2}", stats.median)),
        Cell::new(format!("{:.2}", stats.q3)),
        Cell::new(format!("{:.2}", stats.max)),
    ]);
    println!("\n--- Mark Statistics ---");
    println!("{table}");
}

pub fn print_histogram(histogram: &[usize]) {
    let widest = histogram.iter().copied().max().unwrap_or(0).max(1);

    let mut table = Table::new();
    table.set_header(vec!["Mark", "Students", ""]);
    for (mark, &count) in histogram.iter().enumerate() {
        let bar = "#".repeat((count * 40).div_ceil(widest));
        table.add_row(vec![Cell::new(mark), Cell::new(count), Cell::new(bar)]);
    }
    println!("\n--- Mark Distribution ---");
    println!("{table}");
}

pub fn print_marks(title: &str, results: &[AdjustedResult]) {
    let mut table = Table::new();
    table.set_header(vec!["Student ID", "Name", "Model", "Score", "Max", "Mark"]);
    for r in results {
        table.add_row(vec![
            Cell::new(&r.student_id),
            Cell::new(r.student_name.as_deref().unwrap_or("")),
            Cell::new(&r.model_id),
            Cell::new(format!("{:.2}", r.score)),
            Cell::new(r.max_score),
            Cell::new(format!("{:.2}", round_mark(r.mark))),
        ]);
    }
    println!("\n--- {title} ---");
    println!("{table}");
}
