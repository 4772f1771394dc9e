//! # Metrics CLI Binary
//!
//! Command-line interface for printing league tables.

use anyhow::Result;
use clap::Parser;
use metrics_engine::cli::{resolve_config, Cli, CliHandler};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging; tables go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // Create CLI handler
    let handler = CliHandler::new(config, cli.json)?;

    // Handle command
    handler.handle_command(cli.command)?;

    Ok(())
}
