//! The `gradesync init` command.

use anyhow::Result;

use gradesync_io::config::{CONFIG_FILE, SAMPLE_CONFIG};

pub fn execute() -> Result<()> {
    if std::path::Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} with your voided questions, penalty and roster columns");
    println!("  2. Run: gradesync validate --exam-dir <exam dir>");
    println!(
        "  3. Run: gradesync grade --exam-dir <exam dir> --output-dir <dir> --roster <roster.csv>"
    );

    Ok(())
}
