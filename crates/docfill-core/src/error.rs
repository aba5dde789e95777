//! Error types for the placeholder engine.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Error raised by the engine for a whole call or a single file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Placeholder pattern failed validation. Fatal for the whole call.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Pattern source as supplied by the caller.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// Input document does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Document package is malformed.
    #[error("corrupt document {}: {message}", path.display())]
    PackageCorrupt {
        /// Document path.
        path: PathBuf,
        /// Description from the package layer.
        message: String,
    },

    /// I/O error while reading or writing a document.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Mandatory backup could not be created.
    #[error("backup of {} failed: {source}", path.display())]
    Backup {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Worker pool for parallel processing could not be started.
    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Cancellation token was tripped.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Attach a document path to an error reported by the package layer.
    pub fn from_package(path: &Path, error: PackageError) -> Self {
        match error {
            PackageError::Io(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Self::FileNotFound(path.to_path_buf())
            }
            PackageError::Io(source) => Self::Io {
                path: path.to_path_buf(),
                source,
            },
            other => Self::PackageCorrupt {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }

    /// Serializable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::PackageCorrupt { .. } => ErrorKind::PackageCorrupt,
            Self::Io { .. } | Self::WorkerPool(_) => ErrorKind::IoFailure,
            Self::Backup { .. } => ErrorKind::BackupFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Error category recorded for isolated per-file failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPattern,
    FileNotFound,
    PackageCorrupt,
    IoFailure,
    BackupFailure,
    Cancelled,
}

/// Per-file failure recorded in a scan or replace result.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// Full path of the failed document.
    pub file_path: PathBuf,
    /// File name component of `file_path`.
    pub file_name: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl FileError {
    /// Record `error` against `path`.
    pub fn new(path: &Path, error: &EngineError) -> Self {
        Self {
            file_path: path.to_path_buf(),
            file_name: file_name(path),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Error reported by a document package collaborator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PackageError {
    /// Package structure or XML is malformed.
    #[error("{0}")]
    Corrupt(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required part is absent.
    #[error("missing part: {0}")]
    MissingPart(String),

    /// Image bytes are not a recognized format.
    #[error("unsupported image data")]
    UnsupportedImage,

    /// Mutation requested on a package opened read-only.
    #[error("package was opened read-only")]
    ReadOnly,
}

/// Error inserting into a [`ReplacementMap`](crate::ReplacementMap).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// Key is empty after trimming.
    #[error("placeholder name cannot be empty")]
    EmptyKey,

    /// Key exceeds the maximum length.
    #[error("placeholder name `{key}` exceeds {max} characters")]
    KeyTooLong {
        /// Offending key.
        key: String,
        /// Maximum length in characters.
        max: usize,
    },

    /// Key already present (compared case-insensitively).
    #[error("duplicate placeholder name `{0}`")]
    DuplicateKey(String),
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
