//! Per-control execution: submit the query, classify the stream.

use std::collections::HashMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use verdict_catalog::Severity;
use verdict_query::{QueryError, QueryExecutor};

use crate::classify::{classify, has_status_column, ClassifyContext, STATUS_COLUMN};
use crate::leaf::LeafData;
use crate::node::NodeId;
use crate::result::CheckResult;
use crate::status::Status;
use crate::summary::{CheckSummary, SeveritySummary};

/// Reason attached to results of controls stopped by cancellation.
pub const CANCELED_REASON: &str = "control execution canceled";

/// Everything a worker needs to run one control, detached from the tree.
#[derive(Debug, Clone)]
pub struct ControlTask {
    pub id: NodeId,
    pub name: String,
    pub sql: String,
    pub args: Vec<serde_json::Value>,
    pub severity: Option<Severity>,
    pub tags: HashMap<String, String>,
}

/// The bundle a completed (or failed, or canceled) control reports back.
#[derive(Debug, Clone)]
pub struct ControlOutcome {
    pub control: NodeId,
    pub data: LeafData,
    pub results: Vec<CheckResult>,
    pub summary: CheckSummary,
    pub severity_summary: SeveritySummary,
    /// Set when the control as a whole failed or was canceled
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ControlOutcome {
    /// The outcome of a control that failed (or was canceled) as a whole:
    /// one synthetic error result and an error count of one.
    pub fn failed(control: NodeId, message: impl Into<String>, duration_ms: u64) -> Self {
        let message = message.into();
        let mut summary = CheckSummary::default();
        summary.record(Status::Error);
        Self {
            control,
            data: LeafData::default(),
            results: vec![CheckResult::control_error(control, message.clone())],
            summary,
            severity_summary: SeveritySummary::default(),
            error: Some(message),
            duration_ms,
        }
    }

    /// The outcome of a control canceled before or during execution.
    pub fn canceled(control: NodeId) -> Self {
        Self::failed(control, CANCELED_REASON, 0)
    }
}

/// Execute a single control against the query executor.
///
/// Consumes the row stream until it closes or `cancel` fires, classifying
/// each row and accumulating the control's summaries. Never retries;
/// submission and stream failures become a single error outcome.
pub async fn run_control(
    task: ControlTask,
    executor: &dyn QueryExecutor,
    cancel: &CancellationToken,
) -> ControlOutcome {
    let start = Instant::now();

    if cancel.is_cancelled() {
        return ControlOutcome::canceled(task.id);
    }

    debug!("Running control '{}'", task.name);
    let mut stream = match executor.submit(&task.sql, &task.args, cancel.clone()).await {
        Ok(stream) => stream,
        Err(QueryError::Canceled) => return ControlOutcome::canceled(task.id),
        Err(e) => {
            warn!("Control '{}' failed to submit: {}", task.name, e);
            return ControlOutcome::failed(task.id, e.to_string(), elapsed_ms(start));
        }
    };

    let columns = stream.columns().to_vec();
    if !has_status_column(&columns) {
        stream.close();
        let message = format!("query result is missing required column '{STATUS_COLUMN}'");
        warn!("Control '{}': {}", task.name, message);
        return ControlOutcome::failed(task.id, message, elapsed_ms(start));
    }

    let ctx = ClassifyContext {
        control: task.id,
        severity: task.severity,
        tags: task.tags.clone(),
    };
    let mut data = LeafData::with_columns(columns.clone());
    let mut results = Vec::new();
    let mut summary = CheckSummary::default();
    let mut severity_summary = SeveritySummary::default();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                stream.close();
                return ControlOutcome::canceled(task.id);
            }
            next = stream.next_row() => next,
        };

        match next {
            None => break,
            Some(Ok(row)) => {
                let result = classify(&row, &columns, &ctx);
                summary.record(result.status);
                if result.status == Status::Alarm {
                    if let Some(severity) = result.severity {
                        severity_summary.record_alarm(severity);
                    }
                }
                data.push_row(&row);
                results.push(result);
            }
            Some(Err(QueryError::Canceled)) => {
                stream.close();
                return ControlOutcome::canceled(task.id);
            }
            Some(Err(e)) => {
                stream.close();
                warn!("Control '{}' stream failed: {}", task.name, e);
                return ControlOutcome::failed(task.id, e.to_string(), elapsed_ms(start));
            }
        }
    }

    if results.is_empty() {
        // zero rows: a single synthetic marker, summaries untouched
        results.push(CheckResult::empty(task.id));
    }

    debug!(
        "Control '{}' complete: {} alarm, {} ok, {} error",
        task.name, summary.alarm, summary.ok, summary.error
    );
    ControlOutcome {
        control: task.id,
        data,
        results,
        summary,
        severity_summary,
        error: None,
        duration_ms: elapsed_ms(start),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_query::{MockExecutor, MockResponse};

    fn task(sql: &str) -> ControlTask {
        ControlTask {
            id: NodeId(1),
            name: "test_control".to_string(),
            sql: sql.to_string(),
            args: Vec::new(),
            severity: Some(Severity::High),
            tags: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_two_row_scenario() {
        let executor = MockExecutor::new().respond(
            "select checks",
            MockResponse::rows(
                &["id", "status", "resource", "reason"],
                vec![
                    vec![1.into(), "ok".into(), "r1".into(), "1".into()],
                    vec![2.into(), "alarm".into(), "r2".into(), "2".into()],
                ],
            ),
        );

        let outcome = run_control(task("select checks"), &executor, &CancellationToken::new()).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.summary.alarm, 1);
        assert_eq!(outcome.summary.ok, 1);
        assert_eq!(outcome.summary.total(), 2);
        assert_eq!(outcome.results.len(), 2);
        // row order preserved
        assert_eq!(outcome.results[0].status, Status::Ok);
        assert_eq!(outcome.results[1].status, Status::Alarm);
        // the non-reserved column became a dimension
        assert_eq!(outcome.results[0].dimension("id"), Some("1"));
        // severity summary counts the one alarm
        assert_eq!(outcome.severity_summary.get(Severity::High), 1);
        assert_eq!(outcome.data.row_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_stream_records_empty_marker() {
        let executor = MockExecutor::new()
            .respond("select none", MockResponse::empty(&["status", "resource"]));

        let outcome = run_control(task("select none"), &executor, &CancellationToken::new()).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.summary, CheckSummary::default());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].status, Status::Empty);
        assert_eq!(outcome.data.row_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_is_single_error_outcome() {
        let executor = MockExecutor::new()
            .respond("select broken", MockResponse::submit_failure("relation missing"));

        let outcome =
            run_control(task("select broken"), &executor, &CancellationToken::new()).await;

        assert_eq!(outcome.summary.error, 1);
        assert_eq!(outcome.summary.total(), 1);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].status, Status::Error);
        assert!(outcome.error.as_deref().unwrap().contains("relation missing"));
    }

    #[tokio::test]
    async fn test_stream_failure_is_single_error_outcome() {
        let executor = MockExecutor::new().respond(
            "select flaky",
            MockResponse::rows(&["status"], vec![vec!["ok".into()]])
                .stream_failure("connection reset"),
        );

        let outcome = run_control(task("select flaky"), &executor, &CancellationToken::new()).await;

        // partial rows are discarded, the whole control is one error
        assert_eq!(outcome.summary.error, 1);
        assert_eq!(outcome.summary.total(), 1);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_missing_status_column_fails_fast() {
        let executor = MockExecutor::new().respond(
            "select wrong",
            MockResponse::rows(&["resource"], vec![vec!["r1".into()]]),
        );

        let outcome = run_control(task("select wrong"), &executor, &CancellationToken::new()).await;

        assert_eq!(outcome.summary.error, 1);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("missing required column 'status'"));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let executor = MockExecutor::new();

        let outcome = run_control(task("select never"), &executor, &cancel).await;

        assert_eq!(outcome.results[0].status, Status::Error);
        assert_eq!(outcome.results[0].reason, CANCELED_REASON);
        // nothing was submitted
        assert!(executor.captured_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream() {
        let cancel = CancellationToken::new();
        let executor = MockExecutor::new().respond(
            "select slow",
            MockResponse::rows(&["status"], vec![vec!["ok".into()], vec!["ok".into()]])
                .with_row_delay(std::time::Duration::from_secs(60)),
        );

        let runner = {
            let cancel = cancel.clone();
            let task = task("select slow");
            async move { run_control(task, &executor, &cancel).await }
        };

        let outcome = tokio::join!(runner, async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            cancel.cancel();
        })
        .0;

        assert_eq!(outcome.summary.error, 1);
        assert_eq!(outcome.error.as_deref(), Some(CANCELED_REASON));
    }
}
