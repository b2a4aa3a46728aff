// ABOUTME: Entry point for the berth CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use berth::config::{self, Config};
use berth::error::Result;
use berth::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli.command, Output::new(mode)).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    match command {
        Commands::Init {
            workload,
            orchestrator,
            force,
        } => {
            config::init_config(&cwd, workload.as_deref(), orchestrator.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy { destination } => {
            let config = load_config(&cwd, destination.as_deref())?;
            commands::deploy(config, &cwd, output).await
        }
        Commands::Plan { destination } => {
            let config = load_config(&cwd, destination.as_deref())?;
            commands::plan(config, &cwd, output).await
        }
    }
}

/// Discover the config in `dir` and apply destination overrides if specified.
fn load_config(dir: &std::path::Path, destination: Option<&str>) -> Result<Config> {
    let config = Config::discover(dir)?;
    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}
