//! docfill CLI - find and fill placeholders in Word documents.
//!
//! Provides commands for:
//! - `scan`: List the placeholders found in documents
//! - `replace`: Substitute mapped values and images for placeholders
//! - `validate-pattern`: Check a placeholder pattern without touching documents

mod commands;
mod error;
mod output;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ReplaceArgs, ScanArgs, ValidatePatternArgs};
use output::Output;

/// docfill - find and fill placeholders in Word documents.
#[derive(Parser)]
#[command(name = "docfill", version, about)]
struct Cli {
    /// Enable verbose output (per-file progress logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List placeholders found in documents.
    Scan(ScanArgs),
    /// Replace placeholders with mapped values.
    Replace(ReplaceArgs),
    /// Check that a placeholder pattern compiles.
    ValidatePattern(ValidatePatternArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Scan(args) => args.execute(),
        Commands::Replace(args) => args.execute(),
        Commands::ValidatePattern(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
