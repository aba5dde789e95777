//! `docfill replace` command implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args};
use docfill_config::{CliSettings, Config, OutputFormat};
use docfill_core::{
    CancellationToken, PlaceholderPattern, ReplaceOptions, ReplaceResult, ReplacementMap, Replacer,
};
use docfill_docx::{DocxOpener, FileBackup, discover};
use tracing::info;

use crate::error::CliError;
use crate::output::Output;
use crate::report::replace_report;

/// Arguments for the replace command.
#[derive(Args)]
#[command(group(ArgGroup::new("mapping").required(true).multiple(true).args(["map", "set"])))]
pub(crate) struct ReplaceArgs {
    /// Documents, directories or glob patterns to fill.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// JSON file with an object of placeholder name to value.
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Single mapping, applied after --map. May be repeated.
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Placeholder regex; capture group 1 is the name (overrides config).
    #[arg(short, long)]
    pattern: Option<String>,

    /// Match the pattern case-insensitively.
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Descend into sub-directories of directory inputs.
    #[arg(short, long)]
    recursive: bool,

    /// Back documents up before modifying them (default: enabled).
    #[arg(long)]
    backup: bool,

    /// Do not back documents up.
    #[arg(long, conflicts_with = "backup")]
    no_backup: bool,

    /// Directory for backups (default: next to each document).
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Write filled documents here instead of modifying them in place.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Count replacements without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Process documents in parallel.
    #[arg(long)]
    parallel: bool,

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

impl ReplaceArgs {
    /// Execute the replace command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, the pattern or the mappings are
    /// invalid, or if any document failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            pattern: self.pattern.clone(),
            case_insensitive: self.case_insensitive.then_some(true),
            recursive: self.recursive.then_some(true),
            backup: self.resolve_backup(),
            backup_dir: self.backup_dir.clone(),
            output_dir: self.output_dir.clone(),
            parallel: self.parallel.then_some(true),
            max_parallelism: self.max_parallelism,
            format: self.format,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            info!(path = %path.display(), "Loaded configuration");
        }

        let pattern = PlaceholderPattern::new(&config.scan.pattern, config.scan.pattern_options())?;
        let mappings = load_mappings(self.map.as_deref(), &self.set)?;
        let files = discover(&self.paths, config.scan.recursive)?;
        if files.is_empty() {
            output.warning("No documents found.");
        } else {
            output.info(&format!(
                "Filling {} document(s) with {} mapping(s)...",
                files.len(),
                mappings.len()
            ));
        }

        let settings = &config.replace_resolved;
        let backup = match &settings.backup_dir {
            Some(dir) => FileBackup::new().with_dir(dir),
            None => FileBackup::new(),
        };
        let replacer = Replacer::new(DocxOpener::new())
            .with_backup(backup)
            .with_pattern(pattern)
            .with_max_parallelism(config.scan.max_parallelism);
        let options = ReplaceOptions {
            make_backup: settings.backup,
            backup_required: settings.backup_required,
            output_dir: settings.output_dir.clone(),
            dry_run: self.dry_run,
            parallel: settings.parallel,
        };
        let result = replacer.replace(&files, &mappings, &options, &CancellationToken::new())?;

        output.report(&replace_report(&result, config.format)?)?;
        print_summary(&output, &result);

        if result.failed_files > 0 {
            return Err(CliError::FilesFailed(result.failed_files, result.total_files));
        }
        Ok(())
    }

    /// Resolve `backup` from --backup/--no-backup flags.
    fn resolve_backup(&self) -> Option<bool> {
        self.no_backup
            .then_some(false)
            .or(self.backup.then_some(true))
    }
}

/// Build the replacement map from a JSON file and `KEY=VALUE` pairs.
///
/// Keys that collide ignoring case are rejected, including a `--set` key that
/// repeats one from the file.
fn load_mappings(map: Option<&Path>, set: &[(String, String)]) -> Result<ReplacementMap, CliError> {
    let mut mappings = ReplacementMap::new();
    if let Some(path) = map {
        let content = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        for (key, value) in &entries {
            mappings.insert(key, value)?;
        }
    }
    for (key, value) in set {
        mappings.insert(key, value)?;
    }
    Ok(mappings)
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.to_owned(), value.to_owned()))
}

fn print_summary(output: &Output, result: &ReplaceResult) {
    if result.dry_run {
        output.highlight("[DRY RUN] No documents were modified.");
    }

    for error in result.errors() {
        output.warning(&format!("  {}: {}", error.file_name, error.message));
    }
    for file in &result.files {
        if let Some(backup_error) = &file.backup_error {
            output.warning(&format!(
                "  Backup of {} failed: {backup_error}",
                file.file_path.display()
            ));
        }
    }

    let mut unreplaced: BTreeMap<&str, usize> = BTreeMap::new();
    for placeholder in result.unreplaced() {
        *unreplaced.entry(placeholder.name.as_str()).or_default() += placeholder.occurrences;
    }
    if !unreplaced.is_empty() {
        output.warning(&format!("Placeholders without a mapping ({}):", unreplaced.len()));
        for (name, occurrences) in &unreplaced {
            output.info(&format!("  - {name} ({occurrences})"));
        }
    }

    if !result.unused_mappings.is_empty() {
        output.warning(&format!(
            "Mappings not used by any document: {}",
            result.unused_mappings.join(", ")
        ));
    }

    let summary = format!(
        "Replaced {} placeholder(s) in {} of {} document(s) ({} ms)",
        result.total_replacements,
        result.successful_files,
        result.total_files,
        result.duration.as_millis()
    );
    if result.failed_files == 0 {
        output.success(&summary);
    } else {
        output.warning(&summary);
    }
}
