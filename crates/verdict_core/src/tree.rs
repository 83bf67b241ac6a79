//! The execution tree: building the run structure from a catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use verdict_catalog::{CatalogEntry, CatalogSource, RunFilter, Target};

use crate::error::{CoreError, CoreResult};
use crate::node::{BenchmarkNode, ControlNode, Node, NodeId, RunState};
use crate::result::CheckResult;
use crate::summary::CheckSummary;

/// Name of the synthetic root benchmark wrapping the requested targets.
pub const ROOT_NAME: &str = "root";

/// The hierarchical run structure for one execution.
///
/// The tree owns every node in an arena; nodes reference each other by
/// [`NodeId`] position. Built with every node `Running` and zero summaries,
/// mutated during execution, then read-only for export and regrouping.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionTree {
    nodes: Vec<Node>,
    root: NodeId,
    target: Target,
    run_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl ExecutionTree {
    /// Build the tree for a target, pruning controls excluded by the filter.
    ///
    /// A benchmark whose descendants are all filtered out is dropped
    /// entirely; only the synthetic root may be left without children.
    pub fn build(
        catalog: &dyn CatalogSource,
        target: &Target,
        filter: &RunFilter,
    ) -> CoreResult<Self> {
        let resolved = catalog.resolve(target)?;

        let mut nodes = Vec::new();
        let child_ids: Vec<NodeId> = resolved
            .roots
            .iter()
            .filter_map(|entry| add_entry(&mut nodes, entry, filter))
            .collect();

        let mut root_node = BenchmarkNode::new(ROOT_NAME, target.name());
        root_node.children = child_ids.clone();
        let root = NodeId(nodes.len());
        nodes.push(Node::Benchmark(root_node));
        for child in child_ids {
            nodes[child.0].set_parent(root);
        }

        let tree = Self {
            nodes,
            root,
            target: target.clone(),
            run_id: Uuid::new_v4(),
            started_at: None,
            ended_at: None,
        };
        debug!(
            "Built execution tree for '{}': {} controls",
            tree.target_name(),
            tree.control_ids().len()
        );
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The target descriptor this tree was built for.
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub(crate) fn set_started_at(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
    }

    pub(crate) fn set_ended_at(&mut self, at: DateTime<Utc>) {
        self.ended_at = Some(at);
    }

    /// The aggregated summary at the root.
    pub fn root_summary(&self) -> &CheckSummary {
        self.node(self.root).summary()
    }

    /// Whether every node has completed (and therefore been aggregated).
    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(|n| n.state() == RunState::Complete)
    }

    /// All control node ids, breadth-first from the root.
    pub fn control_ids(&self) -> Vec<NodeId> {
        let mut controls = Vec::new();
        let mut queue = std::collections::VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            match self.node(id) {
                Node::Benchmark(b) => queue.extend(b.children.iter().copied()),
                Node::Control(_) => controls.push(id),
            }
        }
        controls
    }

    /// All control node ids in depth-first tree order, the natural reading
    /// order of the catalog.
    pub fn control_ids_depth_first(&self) -> Vec<NodeId> {
        let mut controls = Vec::new();
        self.collect_controls(self.root, &mut controls);
        controls
    }

    fn collect_controls(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.node(id) {
            Node::Benchmark(b) => {
                for child in &b.children {
                    self.collect_controls(*child, out);
                }
            }
            Node::Control(_) => out.push(id),
        }
    }

    /// Every check result in the tree, flattened in depth-first tree order.
    ///
    /// Row order within a control is preserved.
    pub fn all_results(&self) -> Vec<&CheckResult> {
        let mut results = Vec::new();
        self.collect_results(self.root, &mut results);
        results
    }

    fn collect_results<'a>(&'a self, id: NodeId, out: &mut Vec<&'a CheckResult>) {
        match self.node(id) {
            Node::Benchmark(b) => {
                for child in &b.children {
                    self.collect_results(*child, out);
                }
            }
            Node::Control(c) => out.extend(c.results.iter()),
        }
    }

    /// Ancestor benchmark names of a node, outermost first, excluding the
    /// synthetic root.
    pub fn benchmark_path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self.node(id).parent();
        while let Some(ancestor) = current {
            if ancestor != self.root {
                path.push(self.node(ancestor).name());
            }
            current = self.node(ancestor).parent();
        }
        path.reverse();
        path
    }

    /// Look up a control node, failing on benchmark ids.
    pub fn control(&self, id: NodeId) -> CoreResult<&ControlNode> {
        self.node(id)
            .as_control()
            .ok_or_else(|| CoreError::InvalidState(format!("node {} is not a control", id.0)))
    }
}

fn add_entry(nodes: &mut Vec<Node>, entry: &CatalogEntry, filter: &RunFilter) -> Option<NodeId> {
    match entry {
        CatalogEntry::Control(definition) => {
            if !filter.matches(definition) {
                return None;
            }
            let id = NodeId(nodes.len());
            nodes.push(Node::Control(ControlNode::new(definition)));
            Some(id)
        }
        CatalogEntry::Benchmark(definition) => {
            let child_ids: Vec<NodeId> = definition
                .children
                .iter()
                .filter_map(|child| add_entry(nodes, child, filter))
                .collect();
            if child_ids.is_empty() {
                // benchmarks with no surviving descendants are dropped
                return None;
            }
            let mut node = BenchmarkNode::new(&definition.name, &definition.title);
            node.children = child_ids.clone();
            let id = NodeId(nodes.len());
            nodes.push(Node::Benchmark(node));
            for child in child_ids {
                nodes[child.0].set_parent(id);
            }
            Some(id)
        }
    }
}
