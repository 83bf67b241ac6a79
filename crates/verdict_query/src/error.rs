//! Error types for the query module.

use thiserror::Error;

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while submitting or streaming a query.
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    #[error("Query submission failed: {0}")]
    Submit(String),

    #[error("Row stream failed: {0}")]
    Stream(String),

    #[error("Query canceled")]
    Canceled,
}

impl QueryError {
    /// Whether this error represents cancellation rather than failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, QueryError::Canceled)
    }
}
