use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use et_cli::commands::{extract, summary};
use et_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Extract { log, output_dir }) => {
            extract::run(&mut stdout, log, output_dir.as_deref(), &config)?;
        }
        Some(Commands::Summary { log, json }) => {
            summary::run(&mut stdout, log, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            writeln!(stdout, "{}", Cli::command().render_help())?;
        }
    }

    Ok(())
}
