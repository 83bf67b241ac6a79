//! Concurrent tree execution with bottom-up aggregation.
//!
//! Controls are enumerated breadth-first and fed to a fixed pool of worker
//! tasks. Workers never touch the tree: they report [`ControlOutcome`]s over
//! a channel to the single aggregation loop, which owns the tree, applies
//! each outcome, and walks fan-in counters upward. A benchmark is aggregated
//! exactly once, immediately after its last direct child completes.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verdict_query::QueryExecutor;

use crate::error::{CoreError, CoreResult};
use crate::node::{Node, NodeId, RunState};
use crate::runner::{run_control, ControlOutcome, ControlTask};
use crate::summary::{CheckSummary, SeveritySummary};
use crate::tree::ExecutionTree;

/// Default worker pool size.
pub const DEFAULT_MAX_PARALLEL: usize = 10;

/// Execution settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of controls executing concurrently
    pub max_parallel: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the worker pool size.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }
}

impl ExecutionTree {
    /// Execute every control in the tree and aggregate summaries upward.
    ///
    /// Blocks until the root is aggregated. On cancellation, in-flight
    /// controls stop promptly, not-yet-started controls are recorded as
    /// canceled errors without being submitted, aggregation still runs over
    /// the partial tree, and [`CoreError::Canceled`] is returned — the tree
    /// stays consistent and exportable either way.
    pub async fn execute(
        &mut self,
        executor: Arc<dyn QueryExecutor>,
        options: &RunOptions,
        cancel: CancellationToken,
    ) -> CoreResult<()> {
        if self.started_at().is_some() {
            return Err(CoreError::InvalidState(
                "tree has already been executed".to_string(),
            ));
        }
        self.set_started_at(Utc::now());

        let tasks: VecDeque<ControlTask> = self
            .control_ids()
            .into_iter()
            .filter_map(|id| {
                let control = self.node(id).as_control()?;
                Some(ControlTask {
                    id,
                    name: control.name.clone(),
                    sql: control.sql.clone(),
                    args: control.args.clone(),
                    severity: control.severity,
                    tags: control.tags.clone(),
                })
            })
            .collect();
        let total = tasks.len();
        info!(
            "Starting run '{}': {} controls, max parallel {}",
            self.target_name(),
            total,
            options.max_parallel
        );

        // per-benchmark fan-in counters, decremented as children complete
        let mut pending: Vec<usize> = self
            .nodes()
            .map(|(_, node)| match node {
                Node::Benchmark(b) => b.children.len(),
                Node::Control(_) => 0,
            })
            .collect();

        // only the synthetic root can be childless; aggregate it up front
        if pending[self.root().0] == 0 {
            self.aggregate_benchmark(self.root());
        }

        if total > 0 {
            let queue = Arc::new(Mutex::new(tasks));
            let (tx, mut rx) = mpsc::channel::<ControlOutcome>(options.max_parallel.max(1));

            let worker_count = options.max_parallel.clamp(1, total);
            let mut workers = Vec::with_capacity(worker_count);
            for _ in 0..worker_count {
                let queue = Arc::clone(&queue);
                let executor = Arc::clone(&executor);
                let cancel = cancel.clone();
                let tx = tx.clone();
                workers.push(tokio::spawn(async move {
                    loop {
                        let task = queue.lock().pop_front();
                        let Some(task) = task else { break };
                        let outcome = if cancel.is_cancelled() {
                            ControlOutcome::canceled(task.id)
                        } else {
                            run_control(task, executor.as_ref(), &cancel).await
                        };
                        if tx.send(outcome).await.is_err() {
                            break;
                        }
                    }
                }));
            }
            drop(tx);

            while let Some(outcome) = rx.recv().await {
                let completed = outcome.control;
                self.apply_outcome(outcome);
                self.bubble_completion(completed, &mut pending);
            }
            for worker in workers {
                if let Err(e) = worker.await {
                    warn!("Worker task failed: {}", e);
                }
            }
        }

        debug_assert!(self.is_complete(), "run finished with unaggregated nodes");
        self.set_ended_at(Utc::now());

        let summary = self.root_summary();
        info!(
            "Run '{}' complete: {} alarm, {} ok, {} info, {} skip, {} error",
            self.target_name(),
            summary.alarm,
            summary.ok,
            summary.info,
            summary.skip,
            summary.error
        );

        if cancel.is_cancelled() {
            warn!("Run '{}' was canceled", self.target_name());
            return Err(CoreError::Canceled);
        }
        Ok(())
    }

    /// Write a worker's outcome into its control node and mark it complete.
    fn apply_outcome(&mut self, outcome: ControlOutcome) {
        let Node::Control(control) = self.node_mut(outcome.control) else {
            unreachable!("outcome for a benchmark node");
        };
        control.data = outcome.data;
        control.results = outcome.results;
        control.summary = outcome.summary;
        control.severity_summary = outcome.severity_summary;
        control.error = outcome.error;
        control.duration_ms = outcome.duration_ms;
        control.state = RunState::Complete;
    }

    /// Walk fan-in counters upward from a just-completed node, aggregating
    /// each benchmark whose last child this was.
    fn bubble_completion(&mut self, completed: NodeId, pending: &mut [usize]) {
        let mut current = self.node(completed).parent();
        while let Some(parent) = current {
            pending[parent.0] -= 1;
            if pending[parent.0] > 0 {
                break;
            }
            self.aggregate_benchmark(parent);
            current = self.node(parent).parent();
        }
    }

    /// Roll direct children's summaries into a benchmark, exactly once.
    fn aggregate_benchmark(&mut self, id: NodeId) {
        let children = match self.node(id) {
            Node::Benchmark(b) => b.children.clone(),
            Node::Control(_) => unreachable!("aggregating a control node"),
        };

        let mut summary = CheckSummary::default();
        let mut severity_summary = SeveritySummary::default();
        for child in children {
            let node = self.node(child);
            debug_assert!(
                node.state() == RunState::Complete,
                "aggregating benchmark before child completed"
            );
            summary.merge(node.summary());
            severity_summary.merge(node.severity_summary());
        }

        let Node::Benchmark(benchmark) = self.node_mut(id) else {
            unreachable!();
        };
        benchmark.summary = summary;
        benchmark.severity_summary = severity_summary;
        benchmark.state = RunState::Complete;
        debug!("Aggregated benchmark '{}'", benchmark.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use verdict_catalog::{
        BenchmarkDefinition, Catalog, ControlDefinition, RunFilter, Severity, Target,
    };
    use verdict_query::{MockExecutor, MockResponse};

    /// Assert the summary-consistency invariant for every benchmark.
    fn assert_summaries_consistent(tree: &ExecutionTree) {
        for (_, node) in tree.nodes() {
            let Node::Benchmark(benchmark) = node else {
                continue;
            };
            let mut expected = CheckSummary::default();
            let mut expected_severity = SeveritySummary::default();
            for child in &benchmark.children {
                expected.merge(tree.node(*child).summary());
                expected_severity.merge(tree.node(*child).severity_summary());
            }
            assert_eq!(benchmark.summary, expected, "benchmark '{}'", benchmark.name);
            assert_eq!(
                benchmark.severity_summary, expected_severity,
                "benchmark '{}'",
                benchmark.name
            );
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add_benchmark(
                BenchmarkDefinition::new("bench", "Benchmark")
                    .control(
                        ControlDefinition::new("c_alarms", "Alarms", "select alarms")
                            .with_severity(Severity::Critical),
                    )
                    .control(ControlDefinition::new("c_ok", "Ok", "select ok"))
                    .control(ControlDefinition::new("c_err", "Err", "select err")),
            )
            .unwrap();
        catalog
    }

    fn executor() -> MockExecutor {
        MockExecutor::new()
            .respond(
                "select alarms",
                MockResponse::statuses(vec![("alarm", "r1", "bad"), ("alarm", "r2", "bad")]),
            )
            .respond("select ok", MockResponse::statuses(vec![("ok", "r3", "fine")]))
            .respond("select err", MockResponse::submit_failure("boom"))
    }

    #[tokio::test]
    async fn test_execute_aggregates_to_root() {
        let mut tree = ExecutionTree::build(&catalog(), &Target::All, &RunFilter::None).unwrap();
        tree.execute(
            Arc::new(executor()),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(tree.is_complete());
        assert!(tree.started_at().is_some());
        assert!(tree.ended_at().is_some());

        let summary = tree.root_summary();
        assert_eq!(summary.alarm, 2);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.error, 1);
        assert_summaries_consistent(&tree);

        // both alarms were critical
        let root_severity = tree.node(tree.root()).severity_summary();
        assert_eq!(root_severity.get(Severity::Critical), 2);
        assert_eq!(root_severity.get(Severity::High), 0);
    }

    #[tokio::test]
    async fn test_execute_sequential_pool() {
        let mut tree = ExecutionTree::build(&catalog(), &Target::All, &RunFilter::None).unwrap();
        tree.execute(
            Arc::new(executor()),
            &RunOptions::new().with_max_parallel(1),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_summaries_consistent(&tree);
        assert_eq!(tree.root_summary().total(), 4);
    }

    #[tokio::test]
    async fn test_execute_twice_is_rejected() {
        let mut tree = ExecutionTree::build(&catalog(), &Target::All, &RunFilter::None).unwrap();
        let executor: Arc<dyn QueryExecutor> = Arc::new(executor());
        tree.execute(
            Arc::clone(&executor),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let again = tree
            .execute(executor, &RunOptions::default(), CancellationToken::new())
            .await;
        assert!(matches!(again, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_execute_empty_tree() {
        let catalog = catalog();
        let filter = RunFilter::from_args(None, &["service=nothing".to_string()]).unwrap();
        let mut tree = ExecutionTree::build(&catalog, &Target::All, &filter).unwrap();

        tree.execute(
            Arc::new(MockExecutor::new()),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(tree.is_complete());
        assert_eq!(*tree.root_summary(), CheckSummary::default());
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_results() {
        let executor = MockExecutor::new()
            .respond("select fast", MockResponse::statuses(vec![("ok", "r1", "fine")]))
            .respond(
                "select slow_a",
                MockResponse::statuses(vec![("alarm", "r2", "bad")])
                    .with_row_delay(Duration::from_secs(60)),
            )
            .respond(
                "select slow_b",
                MockResponse::statuses(vec![("alarm", "r3", "bad")])
                    .with_row_delay(Duration::from_secs(60)),
            );

        let mut catalog = Catalog::new();
        catalog
            .add_benchmark(
                BenchmarkDefinition::new("bench", "Benchmark")
                    .control(ControlDefinition::new("fast", "Fast", "select fast"))
                    .control(ControlDefinition::new("slow_a", "Slow A", "select slow_a"))
                    .control(ControlDefinition::new("slow_b", "Slow B", "select slow_b")),
            )
            .unwrap();

        let mut tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();
        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                cancel.cancel();
            })
        };

        let result = tree
            .execute(Arc::new(executor), &RunOptions::default(), cancel)
            .await;
        canceller.await.unwrap();

        assert!(matches!(result, Err(CoreError::Canceled)));
        assert!(tree.is_complete(), "canceled tree must still aggregate");
        assert_summaries_consistent(&tree);

        // the fast control's result survived, the two slow ones are errors
        let summary = tree.root_summary();
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.error, 2);
        assert_eq!(summary.alarm, 0);
    }
}
