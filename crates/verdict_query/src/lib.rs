//! # verdict_query
//!
//! Query executor boundary for Verdict.
//!
//! The engine never talks to a database directly; it submits query text plus
//! bound arguments through the [`QueryExecutor`] trait and consumes an
//! asynchronous [`RowStream`] with column metadata captured once at stream
//! start. Cancellation propagates through a shared token so in-flight
//! streams release their backend resources promptly.
//!
//! The [`MockExecutor`] scripts responses per query for tests and demo runs.
//!
//! # Example
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use verdict_query::{MockExecutor, MockResponse, QueryExecutor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let executor = MockExecutor::new()
//!     .respond("select 1", MockResponse::statuses(vec![("ok", "r1", "fine")]));
//!
//! let mut stream = executor
//!     .submit("select 1", &[], CancellationToken::new())
//!     .await
//!     .unwrap();
//! let row = stream.next_row().await.unwrap().unwrap();
//! assert_eq!(row.values[0], serde_json::json!("ok"));
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod mock;

pub use error::{QueryError, QueryResult};
pub use executor::{ColumnDef, QueryExecutor, Row, RowStream, STREAM_BUFFER};
pub use mock::{CapturedQuery, MockExecutor, MockResponse};
