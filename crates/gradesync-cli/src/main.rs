//! gradesync CLI: grade detected answer sheets and fill roster marks.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gradesync_io::config::{parse_question_list, GradeConfig};

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "gradesync",
    version,
    about = "Exam score adjustment and roster reconciliation"
)]
struct Cli {
    /// Log level for gradesync output
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Grade answer sheets and write the result store and statistics
    Analyze {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Match stored results against a roster and fill in its marks
    FillMarks {
        /// Roster file (.csv, .tsv, .xlsx, .xls)
        #[arg(long)]
        roster: PathBuf,

        /// Directory holding final_marks.csv
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        roster_args: RosterArgs,
    },

    /// Analyze, then fill marks when a roster is given
    Grade {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Roster file (.csv, .tsv, .xlsx, .xls)
        #[arg(long)]
        roster: Option<PathBuf>,

        #[command(flatten)]
        roster_args: RosterArgs,
    },

    /// Summarize the exam models in a directory
    Validate {
        /// Directory with exam_model_*_questions.json files
        #[arg(long)]
        exam_dir: PathBuf,
    },

    /// Generate shuffled exam models from a question file
    Shuffle {
        /// JSON file with a "questions" list
        #[arg(long)]
        questions: PathBuf,

        /// Number of models to generate
        #[arg(long, default_value = "1")]
        models: usize,

        /// Output directory for exam_model_<k>_questions.json
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Seed for question order; question order is kept when absent
        #[arg(long)]
        question_seed: Option<u64>,

        /// Seed for option order
        #[arg(long, default_value_t = gradesync_core::shuffle::DEFAULT_SEED)]
        option_seed: u64,
    },

    /// Create a starter gradesync.toml
    Init,
}

#[derive(Args)]
struct SessionArgs {
    /// Directory with exam_model_*_questions.json files
    #[arg(long)]
    exam_dir: PathBuf,

    /// Detected answers CSV [default: <output-dir>/correction_results.csv]
    #[arg(long)]
    answers: Option<PathBuf>,

    /// Directory for final_marks.csv and reports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct PolicyArgs {
    /// Comma-separated question ids removed for everyone
    #[arg(long)]
    void: Option<String>,

    /// Comma-separated question ids that only count when answered correctly
    #[arg(long)]
    void_nicely: Option<String>,

    /// Points subtracted per wrong answer
    #[arg(long, allow_hyphen_values = true)]
    penalty: Option<f64>,
}

#[derive(Args)]
struct RosterArgs {
    /// Roster column holding student identifiers
    #[arg(long)]
    id_column: Option<String>,

    /// Roster column holding student names
    #[arg(long)]
    name_column: Option<String>,

    /// Roster column to write marks into (created if absent)
    #[arg(long)]
    mark_column: Option<String>,

    /// Keep only id, name and mark columns in the output
    #[arg(long)]
    simplify: bool,

    /// Similarity needed for a fuzzy id match (0-100, 100 = exact only)
    #[arg(long)]
    fuzzy_threshold: Option<f64>,

    /// Roster text encoding
    #[arg(long)]
    encoding: Option<String>,

    /// Roster field separator (a character, or semi, comma, tab, pipe)
    #[arg(long)]
    separator: Option<String>,

    /// Decimal separator for marks in delimited output
    #[arg(long)]
    decimal_separator: Option<String>,
}

impl PolicyArgs {
    fn apply(self, config: &mut GradeConfig) {
        if let Some(void) = self.void {
            config.policy.void = parse_question_list(&void);
        }
        if let Some(void_nicely) = self.void_nicely {
            config.policy.void_nicely = parse_question_list(&void_nicely);
        }
        if let Some(penalty) = self.penalty {
            config.policy.penalty = penalty;
        }
    }
}

impl RosterArgs {
    fn apply(self, config: &mut GradeConfig) {
        let roster = &mut config.roster;
        if self.id_column.is_some() {
            roster.id_column = self.id_column;
        }
        if self.name_column.is_some() {
            roster.name_column = self.name_column;
        }
        if self.mark_column.is_some() {
            roster.mark_column = self.mark_column;
        }
        if self.simplify {
            roster.simplify = true;
        }
        if let Some(encoding) = self.encoding {
            roster.encoding = encoding;
        }
        if let Some(separator) = self.separator {
            roster.separator = separator;
        }
        if let Some(decimal) = self.decimal_separator {
            roster.decimal_separator = decimal;
        }
        if let Some(threshold) = self.fuzzy_threshold {
            config.matching.threshold = threshold;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = format!("gradesync={}", cli.log_level.as_str()).parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        return commands::init::execute();
    }

    let mut config = gradesync_io::load_config_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { session, policy } => {
            policy.apply(&mut config);
            let answers = session.answers_path();
            commands::analyze::execute(&config, &session.exam_dir, &answers, &session.output_dir)
        }
        Commands::FillMarks {
            roster,
            output_dir,
            roster_args,
        } => {
            roster_args.apply(&mut config);
            commands::fill_marks::execute(&config, &roster, &output_dir)
        }
        Commands::Grade {
            session,
            policy,
            roster,
            roster_args,
        } => {
            policy.apply(&mut config);
            roster_args.apply(&mut config);
            let answers = session.answers_path();
            commands::grade::execute(
                &config,
                &session.exam_dir,
                &answers,
                &session.output_dir,
                roster.as_deref(),
            )
        }
        Commands::Validate { exam_dir } => commands::validate::execute(&exam_dir),
        Commands::Shuffle {
            questions,
            models,
            output_dir,
            question_seed,
            option_seed,
        } => commands::shuffle::execute(
            &questions,
            models,
            &output_dir,
            question_seed,
            option_seed,
        ),
        Commands::Init => commands::init::execute(),
    }
}

impl SessionArgs {
    fn answers_path(&self) -> PathBuf {
        self.answers
            .clone()
            .unwrap_or_else(|| self.output_dir.join(gradesync_io::answers::ANSWERS_FILE))
    }
}
