//! `${VAR}` expansion for directory settings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// An unset variable without a default is an error naming `field`. Values
/// without `${` are returned untouched, so a literal `$` in a plain path
/// survives.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("DOCFILL_TEST_BACKUPS", "/srv/backups");
        }
        let result = expand_env("${DOCFILL_TEST_BACKUPS}/contracts", "replace.backup_dir").unwrap();
        assert_eq!(result, "/srv/backups/contracts");
        unsafe {
            std::env::remove_var("DOCFILL_TEST_BACKUPS");
        }
    }

    #[test]
    fn test_expand_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DOCFILL_TEST_UNSET_OUT");
        }
        let result = expand_env("${DOCFILL_TEST_UNSET_OUT:-filled}", "replace.output_dir").unwrap();
        assert_eq!(result, "filled");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DOCFILL_TEST_MISSING");
        }
        let err = expand_env("${DOCFILL_TEST_MISSING}", "replace.output_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("DOCFILL_TEST_MISSING"));
        assert!(err.to_string().contains("replace.output_dir"));
    }

    #[test]
    fn test_bare_dollar_kept() {
        assert_eq!(expand_env("out/$draft", "replace.output_dir").unwrap(), "out/$draft");
        assert_eq!(expand_env("plain", "replace.output_dir").unwrap(), "plain");
    }
}
