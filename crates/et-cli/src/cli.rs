//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Enhancement timing extractor.
///
/// Reconstructs tool, knowledge and LLM-call intervals from an agent log and
/// reports how long each enhancement took.
#[derive(Debug, Parser)]
#[command(name = "et", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract enhancement timings and write the JSON artifacts.
    Extract {
        /// The agent log to mine.
        log: PathBuf,

        /// Directory for the artifacts (defaults to the log's directory).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print enhancement statistics without writing any files.
    Summary {
        /// The agent log to mine.
        log: PathBuf,

        /// Output the statistics artifact as JSON.
        #[arg(long)]
        json: bool,
    },
}
