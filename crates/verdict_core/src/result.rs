//! Typed per-row check results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use verdict_catalog::Severity;

use crate::node::NodeId;
use crate::status::Status;

/// A key/value attribute derived from a non-reserved result column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimension {
    pub key: String,
    pub value: String,
}

impl Dimension {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One classified check result.
///
/// Usually derived from a single query row; the synthetic variants mark an
/// empty result set or a failed/canceled control. `control` is a non-owning
/// back-reference into the tree that produced this result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub status: Status,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub control: NodeId,
}

impl CheckResult {
    /// The synthetic result recorded when a control's query returns no rows.
    pub fn empty(control: NodeId) -> Self {
        Self {
            status: Status::Empty,
            reason: "no rows returned".to_string(),
            resource: String::new(),
            dimensions: Vec::new(),
            tags: HashMap::new(),
            severity: None,
            control,
        }
    }

    /// The synthetic result representing a whole failed control.
    pub fn control_error(control: NodeId, reason: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            reason: reason.into(),
            resource: String::new(),
            dimensions: Vec::new(),
            tags: HashMap::new(),
            severity: None,
            control,
        }
    }

    /// Dimension value by key, if present.
    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }
}
