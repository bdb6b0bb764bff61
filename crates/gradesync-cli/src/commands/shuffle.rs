//! The `gradesync shuffle` command.

use std::path::Path;

use anyhow::{Context, Result};

use gradesync_core::shuffle::build_models;
use gradesync_io::solutions;

pub fn execute(
    questions_path: &Path,
    count: usize,
    output_dir: &Path,
    question_seed: Option<u64>,
    option_seed: u64,
) -> Result<()> {
    if count == 0 {
        anyhow::bail!("--models must be at least 1");
    }
    let questions = solutions::read_questions(questions_path)?;
    let models = build_models(&questions, count, question_seed, option_seed)
        .with_context(|| format!("invalid questions in {}", questions_path.display()))?;

    for model in &models {
        let path = solutions::save_model(output_dir, model)?;
        println!("Created {}", path.display());
    }
    match question_seed {
        Some(seed) => {
            println!("Questions shuffled from seed {seed}; options from seed {option_seed}.")
        }
        None => println!("Question order kept; options shuffled from seed {option_seed}."),
    }
    Ok(())
}
