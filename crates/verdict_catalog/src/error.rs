//! Error types for the catalog module.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Target not found in catalog: {0}")]
    TargetNotFound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid where expression: {0}")]
    WhereParse(String),

    #[error("Duplicate definition name: {0}")]
    DuplicateName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog file error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
