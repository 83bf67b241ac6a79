//! Error types for the export module.

use thiserror::Error;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while formatting or exporting a tree.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Tree is not fully aggregated; refusing to export")]
    IncompleteTree,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
