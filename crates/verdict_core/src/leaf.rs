//! Raw result data attached to a completed control.

use serde::{Deserialize, Serialize};
use verdict_query::{ColumnDef, Row};

/// The raw streamed result of one control's query.
///
/// Rows are re-keyed by column name on ingestion; `columns` preserves the
/// source query's column order and `rows` the stream's row order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeafData {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl LeafData {
    /// Create leaf data holding column metadata but no rows yet.
    pub fn with_columns(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one positional row, keying each value by its column name.
    ///
    /// Values past the known columns are dropped; a duplicate column name
    /// keeps the first value.
    pub fn push_row(&mut self, row: &Row) {
        let mut keyed = serde_json::Map::new();
        for (column, value) in self.columns.iter().zip(row.values.iter()) {
            keyed.entry(column.name.clone()).or_insert(value.clone());
        }
        self.rows.push(keyed);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
