//! Formatter contract and the explicit formatter map.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use verdict_core::ExecutionTree;

use crate::error::{ExportError, ExportResult};
use crate::json::JsonFormatter;
use crate::text::TextFormatter;

/// Renders a completed execution tree into one output encoding.
///
/// Implementations may assume the tree is fully aggregated; they should
/// still refuse incomplete trees rather than render partial data.
pub trait Formatter: Send + Sync {
    /// Format name used for `--output` / `--export` selection.
    fn name(&self) -> &str;

    /// File extension for exported files, without the dot.
    fn file_extension(&self) -> &str;

    /// Render the tree.
    fn format(&self, tree: &ExecutionTree) -> ExportResult<String>;
}

/// An explicit mapping of format names to formatters.
///
/// Constructed once at startup and passed by reference into export calls;
/// there is deliberately no process-wide registry.
#[derive(Clone, Default)]
pub struct FormatterMap {
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl FormatterMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in formatters: `text` and `json`.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.register(Arc::new(TextFormatter));
        map.register(Arc::new(JsonFormatter));
        map
    }

    /// Register a formatter under its own name.
    pub fn register(&mut self, formatter: Arc<dyn Formatter>) {
        debug!("Registering formatter: {}", formatter.name());
        self.formatters
            .insert(formatter.name().to_string(), formatter);
    }

    /// Look up a formatter, failing with the known names on a miss.
    pub fn get(&self, name: &str) -> ExportResult<Arc<dyn Formatter>> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| ExportError::UnknownFormat(name.to_string()))
    }

    /// Registered format names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
