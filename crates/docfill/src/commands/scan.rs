//! `docfill scan` command implementation.

use std::path::PathBuf;

use clap::Args;
use docfill_config::{CliSettings, Config, OutputFormat};
use docfill_core::{CancellationToken, ScanResult, Scanner};
use docfill_docx::{DocxOpener, discover};
use tracing::info;

use crate::error::CliError;
use crate::output::Output;
use crate::report::scan_report;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Documents, directories or glob patterns to scan.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Placeholder regex; capture group 1 is the name. Repeat to scan with
    /// several patterns (default: `scan.pattern` from config).
    #[arg(short, long)]
    pattern: Vec<String>,

    /// Match patterns case-insensitively.
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Descend into sub-directories of directory inputs.
    #[arg(short, long)]
    recursive: bool,

    /// Maximum documents processed at once in parallel mode; 0 means one
    /// per core (overrides config).
    #[arg(long, value_name = "N")]
    max_parallelism: Option<usize>,

    /// Report format: table, json or csv (overrides config).
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Path to configuration file (default: auto-discover docfill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ScanArgs {
    /// Execute the scan command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or a pattern is invalid, or if any
    /// document could not be scanned.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            case_insensitive: self.case_insensitive.then_some(true),
            recursive: self.recursive.then_some(true),
            max_parallelism: self.max_parallelism,
            format: self.format,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            info!(path = %path.display(), "Loaded configuration");
        }

        let patterns = if self.pattern.is_empty() {
            vec![config.scan.pattern.clone()]
        } else {
            self.pattern
        };

        let files = discover(&self.paths, config.scan.recursive)?;
        if files.is_empty() {
            output.warning("No documents found.");
        } else {
            output.info(&format!("Scanning {} document(s)...", files.len()));
        }

        let scanner = Scanner::new(DocxOpener::new())
            .with_max_parallelism(config.scan.max_parallelism);
        let result = scanner.scan_patterns(
            &files,
            &patterns,
            config.scan.pattern_options(),
            &CancellationToken::new(),
        )?;

        output.report(&scan_report(&result, config.format)?)?;
        print_summary(&output, &result);

        if result.failed_files > 0 {
            return Err(CliError::FilesFailed(result.failed_files, result.total_files));
        }
        Ok(())
    }
}

fn print_summary(output: &Output, result: &ScanResult) {
    for error in &result.errors {
        output.warning(&format!("  {}: {}", error.file_name, error.message));
    }

    let summary = format!(
        "Found {} placeholder(s), {} occurrence(s) in {} of {} document(s) ({} ms)",
        result.total_placeholders,
        result.total_occurrences,
        result.scanned_files,
        result.total_files,
        result.duration.as_millis()
    );
    if result.failed_files == 0 {
        output.success(&summary);
    } else {
        output.warning(&summary);
    }
}
