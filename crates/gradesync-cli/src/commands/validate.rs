//! The `gradesync validate` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(exam_dir: &Path) -> Result<()> {
    let store = gradesync_io::solutions::load_solutions(exam_dir)?;

    let mut table = Table::new();
    table.set_header(vec!["Model", "Questions", "Gradable", "Ungraded"]);
    let mut total_ungraded = 0;
    for model in store.models() {
        let ungraded = model.ungraded_ids();
        total_ungraded += ungraded.len();
        let listed: Vec<String> = ungraded.iter().map(|id| id.to_string()).collect();
        table.add_row(vec![
            Cell::new(model.id()),
            Cell::new(model.questions().count()),
            Cell::new(model.gradable_count()),
            Cell::new(listed.join(", ")),
        ]);
    }

    println!("Exam models: {} (max score {})", store.len(), store.max_gradable());
    println!("{table}");
    if total_ungraded == 0 {
        println!("All models valid.");
    } else {
        println!("\n{total_ungraded} ungraded question(s) found.");
    }
    Ok(())
}
