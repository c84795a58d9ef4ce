//! SkullMod CLI - Command-line interface for GFS containers

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skullmod")]
#[command(about = "SkullMod: unpack and repack Skullgirls GFS containers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the SkullMod CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
