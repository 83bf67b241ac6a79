//! Error types for the core engine.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building or executing a tree.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] verdict_catalog::CatalogError),

    #[error("Run canceled")]
    Canceled,

    #[error("Invalid tree state: {0}")]
    InvalidState(String),
}
