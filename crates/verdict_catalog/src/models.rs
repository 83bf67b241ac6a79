//! Data models for control and benchmark definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Severity classification attached to a control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A single named check backed by one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlDefinition {
    /// Unique control name
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Description of what this control verifies
    #[serde(default)]
    pub description: String,
    /// Optional severity classification
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Tags attached to every result of this control
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// The query this control executes
    pub sql: String,
    /// Bound arguments for the query
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl ControlDefinition {
    /// Create a new control definition.
    pub fn new(name: impl Into<String>, title: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: String::new(),
            severity: None,
            tags: HashMap::new(),
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the bound query arguments.
    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }
}

/// A named group of controls and/or nested benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkDefinition {
    /// Unique benchmark name
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Description of what this benchmark covers
    #[serde(default)]
    pub description: String,
    /// Ordered children, declared order is preserved through execution
    #[serde(default)]
    pub children: Vec<CatalogEntry>,
}

impl BenchmarkDefinition {
    /// Create a new benchmark definition.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: String::new(),
            children: Vec::new(),
        }
    }

    /// Append a child control.
    pub fn control(mut self, control: ControlDefinition) -> Self {
        self.children.push(CatalogEntry::Control(control));
        self
    }

    /// Append a child benchmark.
    pub fn benchmark(mut self, benchmark: BenchmarkDefinition) -> Self {
        self.children.push(CatalogEntry::Benchmark(benchmark));
        self
    }
}

/// A catalog entry: either a nested benchmark or a leaf control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntry {
    Benchmark(BenchmarkDefinition),
    Control(ControlDefinition),
}

impl CatalogEntry {
    /// Name of the underlying definition.
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Benchmark(b) => &b.name,
            CatalogEntry::Control(c) => &c.name,
        }
    }
}

/// What a run should execute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Every top-level entry in the catalog
    All,
    /// A single named benchmark
    Benchmark(String),
    /// A single named control
    Control(String),
}

impl Target {
    /// Display name used in reports and errors.
    pub fn name(&self) -> &str {
        match self {
            Target::All => "all",
            Target::Benchmark(name) | Target::Control(name) => name,
        }
    }
}

/// The ordered definition tree a catalog resolves a target to.
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    pub roots: Vec<CatalogEntry>,
}
