//! Mock query executor for testing.
//!
//! Provides a scriptable implementation of the [`QueryExecutor`] trait for
//! use in unit tests and demo runs without a real database. Responses are
//! keyed by query text; calls are captured for verification.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::executor::{ColumnDef, QueryExecutor, Row, RowStream, STREAM_BUFFER};

/// Predefined response for one query.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    /// Column metadata returned at stream start
    pub columns: Vec<ColumnDef>,
    /// Rows streamed in order
    pub rows: Vec<Row>,
    /// Fail the submit call itself with this message
    pub submit_error: Option<String>,
    /// After streaming all rows, fail the stream with this message
    pub stream_error: Option<String>,
    /// Delay before each row is produced
    pub row_delay: Option<Duration>,
}

impl MockResponse {
    /// A response with explicit columns and positional row values.
    pub fn rows(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|name| ColumnDef::new(*name, "text"))
                .collect(),
            rows: rows.into_iter().map(Row::new).collect(),
            ..Default::default()
        }
    }

    /// A `(status, resource, reason)` shaped response, the common control shape.
    pub fn statuses(rows: Vec<(&str, &str, &str)>) -> Self {
        Self::rows(
            &["status", "resource", "reason"],
            rows.into_iter()
                .map(|(status, resource, reason)| {
                    vec![status.into(), resource.into(), reason.into()]
                })
                .collect(),
        )
    }

    /// A response whose stream yields no rows.
    pub fn empty(columns: &[&str]) -> Self {
        Self::rows(columns, Vec::new())
    }

    /// A response that fails at submit time.
    pub fn submit_failure(message: impl Into<String>) -> Self {
        Self {
            submit_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// A response that streams its rows and then fails.
    pub fn stream_failure(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Delay each row by the given duration.
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }
}

/// A captured submit call.
#[derive(Debug, Clone)]
pub struct CapturedQuery {
    pub sql: String,
    pub args: Vec<serde_json::Value>,
}

/// Mock query executor.
///
/// Scripted responses are looked up by exact query text; submitting a query
/// with no scripted response fails, which keeps tests honest about what they
/// execute.
#[derive(Clone, Default)]
pub struct MockExecutor {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    captured: Arc<RwLock<Vec<CapturedQuery>>>,
}

impl MockExecutor {
    /// Create a new mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for the given query text.
    pub fn respond(self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.responses.write().insert(sql.into(), response);
        self
    }

    /// Calls captured so far, in submission order.
    pub fn captured_calls(&self) -> Vec<CapturedQuery> {
        self.captured.read().clone()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn submit(
        &self,
        sql: &str,
        args: &[serde_json::Value],
        cancel: CancellationToken,
    ) -> QueryResult<RowStream> {
        self.captured.write().push(CapturedQuery {
            sql: sql.to_string(),
            args: args.to_vec(),
        });

        let response = self
            .responses
            .read()
            .get(sql)
            .cloned()
            .ok_or_else(|| QueryError::Submit(format!("no scripted response for: {sql}")))?;

        if let Some(message) = response.submit_error {
            return Err(QueryError::Submit(message));
        }
        if cancel.is_cancelled() {
            return Err(QueryError::Canceled);
        }

        debug!("Mock stream opened for: {}", sql);
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let stream = RowStream::new(response.columns.clone(), rx);

        tokio::spawn(async move {
            for row in response.rows {
                if let Some(delay) = response.row_delay {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            let _ = tx.send(Err(QueryError::Canceled)).await;
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = tx.send(Err(QueryError::Canceled)).await;
                        return;
                    }
                    sent = tx.send(Ok(row)) => {
                        if sent.is_err() {
                            // consumer closed the stream
                            return;
                        }
                    }
                }
            }
            if let Some(message) = response.stream_error {
                let _ = tx.send(Err(QueryError::Stream(message))).await;
            }
        });

        Ok(stream)
    }
}
