//! Result types for replace operations.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::FileError;
use crate::scan::{BatchStatus, serialize_millis};

/// Placeholder found in a file with no mapping supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreplacedPlaceholder {
    pub name: String,
    pub file_path: PathBuf,
    pub occurrences: usize,
}

/// Outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReplaceResult {
    pub file_path: PathBuf,
    pub success: bool,
    /// Placeholders replaced (or that would be, in a dry run).
    pub replacements: usize,
    pub backup_path: Option<PathBuf>,
    /// Where the document was written, if it was.
    pub output_path: Option<PathBuf>,
    pub error: Option<FileError>,
    /// Failed optional backup; the file was still processed.
    pub backup_error: Option<String>,
    pub unreplaced: Vec<UnreplacedPlaceholder>,
}

impl FileReplaceResult {
    pub(crate) fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            success: false,
            replacements: 0,
            backup_path: None,
            output_path: None,
            error: None,
            backup_error: None,
            unreplaced: Vec::new(),
        }
    }
}

/// Outcome of a replace batch.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceResult {
    pub status: BatchStatus,
    pub files: Vec<FileReplaceResult>,
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_replacements: usize,
    /// Mapping keys that matched no placeholder in any file.
    pub unused_mappings: Vec<String>,
    pub dry_run: bool,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ReplaceResult {
    /// Unreplaced placeholders across all files.
    pub fn unreplaced(&self) -> impl Iterator<Item = &UnreplacedPlaceholder> {
        self.files.iter().flat_map(|f| f.unreplaced.iter())
    }

    /// Per-file errors.
    pub fn errors(&self) -> impl Iterator<Item = &FileError> {
        self.files.iter().filter_map(|f| f.error.as_ref())
    }
}
