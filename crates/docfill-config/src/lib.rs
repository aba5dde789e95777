//! Configuration management for docfill.
//!
//! Parses `docfill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Directory settings support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `replace.backup_dir`
//! - `replace.output_dir`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use docfill_core::{DEFAULT_PATTERN, PatternOptions, validate_pattern};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docfill.toml";

/// Upper bound for `scan.max_parallelism`.
pub const MAX_PARALLELISM: usize = 256;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub pattern: Option<String>,
    pub case_insensitive: Option<bool>,
    pub recursive: Option<bool>,
    pub max_parallelism: Option<usize>,
    pub backup: Option<bool>,
    pub backup_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub parallel: Option<bool>,
    pub format: Option<OutputFormat>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Placeholder scanning settings.
    pub scan: ScanConfig,
    /// Replace settings (paths are relative strings from TOML).
    replace: ReplaceConfigRaw,
    /// Output settings as written in TOML.
    output: OutputConfigRaw,

    /// Resolved replace configuration (set after loading).
    #[serde(skip)]
    pub replace_resolved: ReplaceConfig,
    /// Report format (set after loading).
    #[serde(skip)]
    pub format: OutputFormat,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Scan configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Text placeholder regex. Capture group 1 is the name.
    pub pattern: String,
    pub case_insensitive: bool,
    /// Descend into sub-directories of directory inputs.
    pub recursive: bool,
    /// Concurrent documents; 0 means one per core.
    pub max_parallelism: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_owned(),
            case_insensitive: false,
            recursive: false,
            max_parallelism: 0,
        }
    }
}

impl ScanConfig {
    pub fn pattern_options(&self) -> PatternOptions {
        PatternOptions {
            case_insensitive: self.case_insensitive,
        }
    }
}

/// Raw replace configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ReplaceConfigRaw {
    backup: Option<bool>,
    backup_required: Option<bool>,
    backup_dir: Option<String>,
    output_dir: Option<String>,
    parallel: Option<bool>,
}

/// Resolved replace configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceConfig {
    /// Back documents up before modifying them.
    pub backup: bool,
    /// Fail a document whose backup could not be made.
    pub backup_required: bool,
    /// Backup location; next to each document when unset.
    pub backup_dir: Option<PathBuf>,
    /// Output location; documents are modified in place when unset.
    pub output_dir: Option<PathBuf>,
    pub parallel: bool,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_required: false,
            backup_dir: None,
            output_dir: None,
            parallel: false,
        }
    }
}

/// Raw output configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    format: Option<String>,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format '{other}' (expected table, json or csv)"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`replace.output_dir`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docfill.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged
    /// configuration is validated again.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(pattern) = &settings.pattern {
            self.scan.pattern.clone_from(pattern);
        }
        if let Some(case_insensitive) = settings.case_insensitive {
            self.scan.case_insensitive = case_insensitive;
        }
        if let Some(recursive) = settings.recursive {
            self.scan.recursive = recursive;
        }
        if let Some(max_parallelism) = settings.max_parallelism {
            self.scan.max_parallelism = max_parallelism;
        }
        if let Some(backup) = settings.backup {
            self.replace_resolved.backup = backup;
        }
        if let Some(backup_dir) = &settings.backup_dir {
            self.replace_resolved.backup_dir = Some(backup_dir.clone());
        }
        if let Some(output_dir) = &settings.output_dir {
            self.replace_resolved.output_dir = Some(output_dir.clone());
        }
        if let Some(parallel) = settings.parallel {
            self.replace_resolved.parallel = parallel;
        }
        if let Some(format) = settings.format {
            self.format = format;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pattern(&self.scan.pattern, self.scan.pattern_options())
            .map_err(|e| ConfigError::Validation(format!("scan.pattern: {e}")))?;

        if self.scan.max_parallelism > MAX_PARALLELISM {
            return Err(ConfigError::Validation(format!(
                "scan.max_parallelism cannot exceed {MAX_PARALLELISM}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in directory settings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.replace.backup_dir {
            self.replace.backup_dir = Some(expand::expand_env(dir, "replace.backup_dir")?);
        }
        if let Some(ref dir) = self.replace.output_dir {
            self.replace.output_dir = Some(expand::expand_env(dir, "replace.output_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory and parse the
    /// output format.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let defaults = ReplaceConfig::default();
        self.replace_resolved = ReplaceConfig {
            backup: self.replace.backup.unwrap_or(defaults.backup),
            backup_required: self
                .replace
                .backup_required
                .unwrap_or(defaults.backup_required),
            backup_dir: self.replace.backup_dir.as_deref().map(|d| config_dir.join(d)),
            output_dir: self.replace.output_dir.as_deref().map(|d| config_dir.join(d)),
            parallel: self.replace.parallel.unwrap_or(defaults.parallel),
        };

        self.format = match self.output.format.as_deref() {
            Some(format) => format
                .parse()
                .map_err(|e| ConfigError::Validation(format!("output.format: {e}")))?,
            None => OutputFormat::default(),
        };

        Ok(())
    }
}
