//! Result types for scan operations.

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::aggregate::{Placeholder, merge_placeholders};
use crate::error::FileError;

/// Terminal state of a scan or replace batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every file was processed.
    Succeeded,
    /// At least one file failed. Results from the others are kept.
    PartiallyFailed,
    /// The cancellation token was tripped before all files finished.
    Cancelled,
}

impl BatchStatus {
    pub(crate) fn from_counts(failed_files: usize, cancelled: bool) -> Self {
        if cancelled {
            Self::Cancelled
        } else if failed_files > 0 {
            Self::PartiallyFailed
        } else {
            Self::Succeeded
        }
    }
}

/// Outcome of scanning a batch of files.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub status: BatchStatus,
    /// Placeholders sorted by name, then kind.
    pub placeholders: Vec<Placeholder>,
    /// Files submitted.
    pub total_files: usize,
    /// Files scanned without error.
    pub scanned_files: usize,
    pub failed_files: usize,
    /// Distinct placeholders found.
    pub total_placeholders: usize,
    /// Occurrences across all placeholders.
    pub total_occurrences: usize,
    pub errors: Vec<FileError>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ScanResult {
    /// Combine results of two passes over the same file set.
    ///
    /// Locations are concatenated per placeholder and errors are concatenated.
    /// Durations add up. File and placeholder counts take the larger value so
    /// that repeated passes do not inflate them.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let cancelled =
            self.status == BatchStatus::Cancelled || other.status == BatchStatus::Cancelled;
        let placeholders = merge_placeholders(self.placeholders, other.placeholders);
        let total_occurrences = placeholders.iter().map(|p| p.total_occurrences).sum();
        let failed_files = self.failed_files.max(other.failed_files);

        let mut errors = self.errors;
        errors.extend(other.errors);

        Self {
            status: BatchStatus::from_counts(failed_files, cancelled),
            placeholders,
            total_files: self.total_files.max(other.total_files),
            scanned_files: self.scanned_files.max(other.scanned_files),
            failed_files,
            total_placeholders: self.total_placeholders.max(other.total_placeholders),
            total_occurrences,
            errors,
            duration: self.duration + other.duration,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{EngineError, ErrorKind};
    use crate::pattern::PlaceholderKind;
    use crate::scan::aggregate::PlaceholderLocation;

    static_assertions::assert_impl_all!(ScanResult: Send, Sync);

    fn placeholder(name: &str, file: &str, occurrences: usize) -> Placeholder {
        Placeholder {
            name: name.to_owned(),
            kind: PlaceholderKind::Text,
            pattern: "p".to_owned(),
            locations: vec![PlaceholderLocation {
                file_name: file.to_owned(),
                file_path: PathBuf::from(file),
                occurrences,
                context: String::new(),
                section: "Body".to_owned(),
            }],
            total_occurrences: occurrences,
        }
    }

    fn result(placeholders: Vec<Placeholder>, failed: usize, millis: u64) -> ScanResult {
        let errors = (0..failed)
            .map(|_| FileError::new(&PathBuf::from("bad.docx"), &EngineError::Cancelled))
            .collect();
        ScanResult {
            status: BatchStatus::from_counts(failed, false),
            total_files: 3,
            scanned_files: 3 - failed,
            failed_files: failed,
            total_placeholders: placeholders.len(),
            total_occurrences: placeholders.iter().map(|p| p.total_occurrences).sum(),
            placeholders,
            errors,
            duration: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_merge_additive_for_disjoint_names() {
        let first = result(vec![placeholder("a", "1.docx", 2)], 0, 10);
        let second = result(vec![placeholder("b", "1.docx", 3)], 0, 5);

        let merged = first.merge(second);

        assert_eq!(merged.total_occurrences, 5);
        assert_eq!(merged.placeholders.len(), 2);
        assert_eq!(merged.total_files, 3);
        assert_eq!(merged.scanned_files, 3);
        assert_eq!(merged.duration, Duration::from_millis(15));
        assert_eq!(merged.status, BatchStatus::Succeeded);
    }

    #[test]
    fn test_merge_same_name_concatenates() {
        let first = result(vec![placeholder("a", "1.docx", 1)], 0, 1);
        let second = result(vec![placeholder("a", "2.docx", 4)], 1, 1);

        let merged = first.merge(second);

        assert_eq!(merged.placeholders.len(), 1);
        assert_eq!(merged.placeholders[0].locations.len(), 2);
        assert_eq!(merged.placeholders[0].total_occurrences, 5);
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.errors[0].kind, ErrorKind::Cancelled);
        assert_eq!(merged.failed_files, 1);
        assert_eq!(merged.status, BatchStatus::PartiallyFailed);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(result(Vec::new(), 0, 1500)).unwrap();
        assert_eq!(value["duration_ms"], 1500);
        assert_eq!(value["status"], "succeeded");
    }
}
