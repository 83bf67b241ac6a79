//! Query executor trait and streaming result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::QueryResult;

/// Buffered rows in flight between the executor and a consumer.
pub const STREAM_BUFFER: usize = 64;

/// Column metadata, captured once when a stream opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name as returned by the query
    pub name: String,
    /// Backend type name, informational only
    pub data_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A single result row with values in column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Row {
    pub values: Vec<serde_json::Value>,
}

impl Row {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self { values }
    }
}

/// An open row stream for one submitted query.
///
/// Column metadata is captured once at stream start; rows arrive
/// asynchronously in source order. Dropping or closing the stream releases
/// the executor side promptly.
pub struct RowStream {
    columns: Vec<ColumnDef>,
    rows: mpsc::Receiver<QueryResult<Row>>,
}

impl RowStream {
    /// Create a stream from captured columns and a row channel.
    pub fn new(columns: Vec<ColumnDef>, rows: mpsc::Receiver<QueryResult<Row>>) -> Self {
        Self { columns, rows }
    }

    /// Column metadata for every row in this stream.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Await the next row; `None` means the stream closed cleanly.
    pub async fn next_row(&mut self) -> Option<QueryResult<Row>> {
        self.rows.recv().await
    }

    /// Close the stream, signalling the executor to stop producing rows.
    pub fn close(&mut self) {
        self.rows.close();
    }
}

/// Contract around the external query engine.
///
/// Implementations submit a query and stream rows back; they must stop
/// producing promptly once `cancel` fires or the returned stream is closed.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Submit a query with bound arguments, returning an open row stream.
    async fn submit(
        &self,
        sql: &str,
        args: &[serde_json::Value],
        cancel: CancellationToken,
    ) -> QueryResult<RowStream>;
}
