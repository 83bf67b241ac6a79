//! # verdict_export
//!
//! Formatters and snapshot export for Verdict.
//!
//! The engine hands a fully aggregated [`verdict_core::ExecutionTree`] to a
//! [`Formatter`] looked up in an explicit [`FormatterMap`]; the [`Snapshot`]
//! projection is what publishers persist or upload. Nothing here ever
//! re-executes a control.

pub mod error;
pub mod formatter;
pub mod json;
pub mod snapshot;
pub mod text;

pub use error::{ExportError, ExportResult};
pub use formatter::{Formatter, FormatterMap};
pub use json::JsonFormatter;
pub use snapshot::{Snapshot, SnapshotNode, SNAPSHOT_SCHEMA_VERSION};
pub use text::TextFormatter;
