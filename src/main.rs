//! Sapling - adaptive learning engine
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sapling::cli::open_engine;
use sapling::config::{sapling_home, EngineConfig};
use sapling::engine::AdaptiveLearningEngine;
use sapling::error::{exit_codes, SaplingError};
use sapling::storage::FileSnapshotStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// Sapling - track learner performance and adapt what comes next
#[derive(Parser)]
#[command(name = "sapling")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one graded attempt
    Track {
        /// Learner id
        user: String,
        /// Subject name
        subject: String,
        /// Explicit question id
        #[arg(long)]
        id: Option<String>,
        /// Word the question is about
        #[arg(long)]
        word: Option<String>,
        /// Question text
        #[arg(long)]
        question: Option<String>,
        /// Expected answer
        #[arg(long)]
        answer: Option<String>,
        /// Difficulty tier (EASY, MEDIUM, HARD)
        #[arg(long, short)]
        difficulty: Option<String>,
        /// The attempt was correct
        #[arg(long, short)]
        correct: bool,
        /// Response time in milliseconds
        #[arg(long, short, default_value_t = 0)]
        response_time: u64,
        /// A hint was used
        #[arg(long)]
        hint: bool,
        /// Number of tries before the final answer
        #[arg(long)]
        attempts: Option<u32>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show performance analytics for a learner and subject
    Analytics {
        user: String,
        subject: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Suggest the next difficulty tier
    Adjust {
        user: String,
        subject: String,
        /// Current difficulty tier
        #[arg(long, short, default_value = "MEDIUM")]
        current: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Pick the next questions from a pool
    Select {
        user: String,
        subject: String,
        /// JSON file containing an array of questions
        #[arg(long, short)]
        pool: PathBuf,
        /// Number of questions to select
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Rank subjects by what to study next
    Recommend {
        user: String,
        /// Subjects to rank (defaults to every tracked subject)
        subjects: Vec<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Export all state as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Replace all state with an exported JSON file
    Import {
        /// Exported JSON file
        input: PathBuf,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Remove attempts older than a maximum age
    Prune {
        /// Maximum age to keep (e.g., 30d, 12h)
        #[arg(long)]
        older_than: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Forget a learner's state for one subject or all subjects
    Reset {
        user: String,
        /// Only reset this subject
        #[arg(long, short)]
        subject: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sapling error: {}", e);
            let code = match e.downcast_ref::<SaplingError>() {
                Some(SaplingError::Config { .. }) => exit_codes::CONFIG,
                _ => exit_codes::ERROR,
            };
            ExitCode::from(code as u8)
        }
    }
}

/// Log to stderr, filtered by `SAPLING_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SAPLING_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Set up the global panic handler.
///
/// On panic, appends to `$SAPLING_HOME/crash.log` and exits with the error code.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("sapling panic: {}", info);

        if let Some(home) = sapling_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::ERROR);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let engine = open(&cwd)?;

    match cli.command {
        Commands::Track {
            user,
            subject,
            id,
            word,
            question,
            answer,
            difficulty,
            correct,
            response_time,
            hint,
            attempts,
            json,
            quiet,
        } => {
            use sapling::cli::track::{TrackCommand, TrackOptions};

            let cmd = TrackCommand::new(&engine);
            let options = TrackOptions {
                json,
                quiet,
                user,
                subject,
                id,
                word,
                question,
                answer,
                difficulty,
                correct,
                response_time,
                hint,
                attempts,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Analytics {
            user,
            subject,
            json,
            quiet,
        } => {
            use sapling::cli::analytics::{AnalyticsCommand, AnalyticsOptions};

            let cmd = AnalyticsCommand::new(&engine);
            let options = AnalyticsOptions {
                json,
                quiet,
                user,
                subject,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Adjust {
            user,
            subject,
            current,
            json,
            quiet,
        } => {
            use sapling::cli::adjust::{AdjustCommand, AdjustOptions};

            let cmd = AdjustCommand::new(&engine);
            let options = AdjustOptions {
                json,
                quiet,
                user,
                subject,
                current,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Select {
            user,
            subject,
            pool,
            count,
            json,
            quiet,
        } => {
            use sapling::cli::select::{SelectCommand, SelectOptions};

            let cmd = SelectCommand::new(&engine);
            let options = SelectOptions {
                json,
                quiet,
                user,
                subject,
                pool,
                count,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Recommend {
            user,
            subjects,
            json,
            quiet,
        } => {
            use sapling::cli::recommend::{RecommendCommand, RecommendOptions};

            let cmd = RecommendCommand::new(&engine);
            let options = RecommendOptions {
                json,
                quiet,
                user,
                subjects,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Export {
            output,
            json,
            quiet,
        } => {
            use sapling::cli::transfer::{ExportCommand, ExportOptions};

            let cmd = ExportCommand::new(&engine);
            let options = ExportOptions {
                json,
                quiet,
                output,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Import { input, json, quiet } => {
            use sapling::cli::transfer::{ImportCommand, ImportOptions};

            let cmd = ImportCommand::new(&engine);
            let options = ImportOptions { json, quiet, input };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Prune {
            older_than,
            json,
            quiet,
        } => {
            use sapling::cli::maintain::{PruneCommand, PruneOptions};

            let cmd = PruneCommand::new(&engine);
            let options = PruneOptions {
                json,
                quiet,
                older_than,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
        Commands::Reset {
            user,
            subject,
            json,
            quiet,
        } => {
            use sapling::cli::maintain::{ResetCommand, ResetOptions};

            let cmd = ResetCommand::new(&engine);
            let options = ResetOptions {
                json,
                quiet,
                user,
                subject,
            };
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }
    }
}

fn open(cwd: &Path) -> Result<AdaptiveLearningEngine<FileSnapshotStore>, SaplingError> {
    open_engine(EngineConfig::load_from_cwd(cwd))
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted.trim_end_matches('\n'));
    }
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}
