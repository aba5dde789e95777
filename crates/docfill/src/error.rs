//! CLI error types.

use docfill_config::ConfigError;
use docfill_core::{EngineError, MappingError};
use docfill_docx::DiscoveryError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    #[error("{0}")]
    Mapping(#[from] MappingError),

    #[error("invalid mapping file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} of {1} document(s) failed")]
    FilesFailed(usize, usize),
}
