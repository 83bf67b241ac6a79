//! Tree nodes: benchmarks and controls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use verdict_catalog::Severity;

use crate::leaf::LeafData;
use crate::result::CheckResult;
use crate::summary::{CheckSummary, SeveritySummary};

/// Index of a node within its tree's arena.
///
/// Node identifiers are positions, not pointers; the tree is the single
/// owner of every node and result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Run state of a node.
///
/// Controls transition to `Complete` when their runner reports an outcome;
/// benchmarks when they are aggregated after their last child completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Complete,
}

/// A named group of controls and/or nested benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkNode {
    pub name: String,
    pub title: String,
    pub children: Vec<NodeId>,
    pub summary: CheckSummary,
    pub severity_summary: SeveritySummary,
    pub state: RunState,
    pub parent: Option<NodeId>,
}

impl BenchmarkNode {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            children: Vec::new(),
            summary: CheckSummary::default(),
            severity_summary: SeveritySummary::default(),
            state: RunState::Running,
            parent: None,
        }
    }
}

/// A single executable check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlNode {
    pub name: String,
    pub title: String,
    pub severity: Option<Severity>,
    pub tags: HashMap<String, String>,
    pub sql: String,
    pub args: Vec<serde_json::Value>,
    pub data: LeafData,
    pub results: Vec<CheckResult>,
    pub summary: CheckSummary,
    pub severity_summary: SeveritySummary,
    pub state: RunState,
    /// Execution error message, set when the whole control failed
    pub error: Option<String>,
    pub duration_ms: u64,
    pub parent: Option<NodeId>,
}

impl ControlNode {
    pub fn new(definition: &verdict_catalog::ControlDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            title: definition.title.clone(),
            severity: definition.severity,
            tags: definition.tags.clone(),
            sql: definition.sql.clone(),
            args: definition.args.clone(),
            data: LeafData::default(),
            results: Vec::new(),
            summary: CheckSummary::default(),
            severity_summary: SeveritySummary::default(),
            state: RunState::Running,
            error: None,
            duration_ms: 0,
            parent: None,
        }
    }
}

/// A tree node: either a benchmark grouping or a leaf control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Benchmark(BenchmarkNode),
    Control(ControlNode),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Benchmark(b) => &b.name,
            Node::Control(c) => &c.name,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Node::Benchmark(b) => &b.title,
            Node::Control(c) => &c.title,
        }
    }

    pub fn summary(&self) -> &CheckSummary {
        match self {
            Node::Benchmark(b) => &b.summary,
            Node::Control(c) => &c.summary,
        }
    }

    pub fn severity_summary(&self) -> &SeveritySummary {
        match self {
            Node::Benchmark(b) => &b.severity_summary,
            Node::Control(c) => &c.severity_summary,
        }
    }

    pub fn state(&self) -> RunState {
        match self {
            Node::Benchmark(b) => b.state,
            Node::Control(c) => c.state,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Benchmark(b) => b.parent,
            Node::Control(c) => c.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        match self {
            Node::Benchmark(b) => b.parent = Some(parent),
            Node::Control(c) => c.parent = Some(parent),
        }
    }

    pub fn as_benchmark(&self) -> Option<&BenchmarkNode> {
        match self {
            Node::Benchmark(b) => Some(b),
            Node::Control(_) => None,
        }
    }

    pub fn as_control(&self) -> Option<&ControlNode> {
        match self {
            Node::Benchmark(_) => None,
            Node::Control(c) => Some(c),
        }
    }
}
