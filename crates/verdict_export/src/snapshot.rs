//! Serializable snapshot projection of a completed tree.
//!
//! The projection is derived purely from the tree, never by re-execution,
//! and carries everything a publisher needs: the run identity, the root
//! summary, the node hierarchy and every leaf result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdict_catalog::Severity;
use verdict_core::{
    CheckResult, CheckSummary, ExecutionTree, LeafData, Node, NodeId, SeveritySummary,
};

use crate::error::{ExportError, ExportResult};

/// Snapshot schema version, bumped on breaking shape changes.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1";

/// A persisted projection of one completed execution tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    pub run_id: Uuid,
    pub target: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: CheckSummary,
    pub severity_summary: SeveritySummary,
    pub root: SnapshotNode,
}

/// A node of the snapshot hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotNode {
    Benchmark {
        name: String,
        title: String,
        summary: CheckSummary,
        severity_summary: SeveritySummary,
        children: Vec<SnapshotNode>,
    },
    Control {
        name: String,
        title: String,
        severity: Option<Severity>,
        summary: CheckSummary,
        severity_summary: SeveritySummary,
        error: Option<String>,
        duration_ms: u64,
        results: Vec<CheckResult>,
        data: LeafData,
    },
}

impl Snapshot {
    /// Project a completed tree into its snapshot form.
    ///
    /// Fails with [`ExportError::IncompleteTree`] if any node is still
    /// running; callers must only export fully aggregated trees.
    pub fn from_tree(tree: &ExecutionTree) -> ExportResult<Self> {
        if !tree.is_complete() {
            return Err(ExportError::IncompleteTree);
        }
        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            run_id: tree.run_id(),
            target: tree.target_name().to_string(),
            started_at: tree.started_at(),
            ended_at: tree.ended_at(),
            summary: *tree.root_summary(),
            severity_summary: tree.node(tree.root()).severity_summary().clone(),
            root: project_node(tree, tree.root()),
        })
    }
}

fn project_node(tree: &ExecutionTree, id: NodeId) -> SnapshotNode {
    match tree.node(id) {
        Node::Benchmark(b) => SnapshotNode::Benchmark {
            name: b.name.clone(),
            title: b.title.clone(),
            summary: b.summary,
            severity_summary: b.severity_summary.clone(),
            children: b
                .children
                .iter()
                .map(|child| project_node(tree, *child))
                .collect(),
        },
        Node::Control(c) => SnapshotNode::Control {
            name: c.name.clone(),
            title: c.title.clone(),
            severity: c.severity,
            summary: c.summary,
            severity_summary: c.severity_summary.clone(),
            error: c.error.clone(),
            duration_ms: c.duration_ms,
            results: c.results.clone(),
            data: c.data.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use verdict_catalog::{BenchmarkDefinition, Catalog, ControlDefinition, RunFilter, Target};
    use verdict_core::RunOptions;
    use verdict_query::{MockExecutor, MockResponse};

    async fn completed_tree() -> ExecutionTree {
        let mut catalog = Catalog::new();
        catalog
            .add_benchmark(
                BenchmarkDefinition::new("bench", "Benchmark")
                    .control(
                        ControlDefinition::new("c1", "C1", "select 1")
                            .with_severity(Severity::High),
                    )
                    .control(ControlDefinition::new("c2", "C2", "select 2")),
            )
            .unwrap();

        let executor = MockExecutor::new()
            .respond(
                "select 1",
                MockResponse::statuses(vec![("alarm", "r1", "bad")]),
            )
            .respond("select 2", MockResponse::empty(&["status"]));

        let mut tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();
        tree.execute(
            Arc::new(executor),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        tree
    }

    #[tokio::test]
    async fn test_snapshot_projects_full_hierarchy() {
        let tree = completed_tree().await;
        let snapshot = Snapshot::from_tree(&tree).unwrap();

        assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(snapshot.summary.alarm, 1);
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.ended_at.is_some());

        let SnapshotNode::Benchmark { children, .. } = &snapshot.root else {
            panic!("root must be a benchmark");
        };
        assert_eq!(children.len(), 1);
        let SnapshotNode::Benchmark {
            name, children, ..
        } = &children[0]
        else {
            panic!("expected nested benchmark");
        };
        assert_eq!(name, "bench");
        assert_eq!(children.len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_round_trips_through_json() {
        let tree = completed_tree().await;
        let snapshot = Snapshot::from_tree(&tree).unwrap();

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.run_id, snapshot.run_id);
        assert_eq!(restored.summary, snapshot.summary);
    }

    #[test]
    fn test_snapshot_rejects_running_tree() {
        let mut catalog = Catalog::new();
        catalog
            .add_control(ControlDefinition::new("c1", "C1", "select 1"))
            .unwrap();
        let tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();

        assert!(matches!(
            Snapshot::from_tree(&tree),
            Err(ExportError::IncompleteTree)
        ));
    }
}
