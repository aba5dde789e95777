//! Candidate document discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::{debug, warn};

/// Error expanding discovery inputs.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Input is not a valid glob pattern.
    #[error("invalid glob pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Expand files, directories and glob patterns into a sorted list of
/// documents.
///
/// Existing files are taken as given. Directories contribute their `.docx`
/// files, descending into sub-directories when `recursive` is set. Anything
/// else containing glob syntax is expanded as a pattern. Word lock files
/// (`~$name.docx`) and hidden entries are skipped during expansion. A plain
/// path that does not exist is kept so the caller can report it.
pub fn discover<P: AsRef<Path>>(
    inputs: &[P],
    recursive: bool,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut found = BTreeSet::new();

    for input in inputs {
        let path = input.as_ref();
        if path.is_dir() {
            let base = glob::Pattern::escape(path.to_string_lossy().trim_end_matches(['/', '\\']));
            let pattern = if recursive {
                format!("{base}/**/*.docx")
            } else {
                format!("{base}/*.docx")
            };
            found.extend(
                expand(&pattern)?
                    .into_iter()
                    .filter(|p| !has_hidden_component(p.strip_prefix(path).unwrap_or(p))),
            );
        } else if path.is_file() {
            found.insert(path.to_path_buf());
        } else if is_pattern(&path.to_string_lossy()) {
            found.extend(expand(&path.to_string_lossy())?);
        } else {
            found.insert(path.to_path_buf());
        }
    }

    debug!(inputs = inputs.len(), documents = found.len(), "Discovered documents");
    Ok(found.into_iter().collect())
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let paths = glob::glob_with(pattern, options).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() && is_document(&path) => found.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Cannot read path during discovery"),
        }
    }
    Ok(found)
}

fn has_hidden_component(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// `.docx` file that is neither a Word lock file nor hidden.
fn is_document(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
    is_docx && !name.starts_with("~$") && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in [
            "a.docx",
            "b.DOCX",
            "~$a.docx",
            ".hidden.docx",
            "notes.txt",
            "sub/c.docx",
            "sub/deeper/d.docx",
            ".git/e.docx",
        ] {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"").unwrap();
        }
        dir
    }

    fn relative(dir: &TempDir, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_directory_non_recursive() {
        let dir = tree();
        let found = discover(&[dir.path()], false).unwrap();
        assert_eq!(relative(&dir, found), vec!["a.docx", "b.DOCX"]);
    }

    #[test]
    fn test_directory_recursive_skips_hidden() {
        let dir = tree();
        let found = discover(&[dir.path()], true).unwrap();
        assert_eq!(
            relative(&dir, found),
            vec!["a.docx", "b.DOCX", "sub/c.docx", "sub/deeper/d.docx"]
        );
    }

    #[test]
    fn test_glob_pattern_input() {
        let dir = tree();
        let pattern = format!(
            "{}/sub/*.docx",
            glob::Pattern::escape(&dir.path().to_string_lossy())
        );
        let found = discover(&[pattern], false).unwrap();
        assert_eq!(relative(&dir, found), vec!["sub/c.docx"]);
    }

    #[test]
    fn test_explicit_and_missing_paths() {
        let dir = tree();
        let explicit = dir.path().join("a.docx");
        let missing = dir.path().join("missing.docx");
        let found = discover(&[dir.path().to_path_buf(), explicit, missing], false).unwrap();
        assert_eq!(
            relative(&dir, found),
            vec!["a.docx", "b.DOCX", "missing.docx"]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let result = discover(&["docs/[.docx"], false);
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern { .. })));
    }
}
