//! `docfill validate-pattern` command implementation.

use clap::Args;
use docfill_core::{PatternOptions, validate_pattern};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate-pattern command.
#[derive(Args)]
pub(crate) struct ValidatePatternArgs {
    /// Placeholder regex to check; capture group 1 must hold the name.
    pattern: String,

    /// Compile the pattern case-insensitively.
    #[arg(short = 'i', long)]
    case_insensitive: bool,
}

impl ValidatePatternArgs {
    /// Execute the validate-pattern command.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the pattern is rejected.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let options = PatternOptions {
            case_insensitive: self.case_insensitive,
        };
        validate_pattern(&self.pattern, options)?;
        Output::new().success(&format!("Pattern is valid: {}", self.pattern));
        Ok(())
    }
}
