//! Plain-text report formatter.

use verdict_core::{ExecutionTree, Node, NodeId, Status};

use crate::error::{ExportError, ExportResult};
use crate::formatter::Formatter;

/// Renders the tree as an indented plain-text report with per-node
/// summaries, result lines and a trailing total.
#[derive(Debug, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn file_extension(&self) -> &str {
        "txt"
    }

    fn format(&self, tree: &ExecutionTree) -> ExportResult<String> {
        if !tree.is_complete() {
            return Err(ExportError::IncompleteTree);
        }

        let mut out = String::new();
        let summary = tree.root_summary();
        out.push_str(&format!(
            "Run: {} ({})\n",
            tree.target_name(),
            tree.run_id()
        ));
        out.push_str(&format!(
            "Status: {}\n\n",
            if summary.passed() { "PASSED" } else { "FAILED" }
        ));

        let root = tree.node(tree.root());
        if let Node::Benchmark(b) = root {
            for child in &b.children {
                render_node(tree, *child, 0, &mut out);
            }
        }

        out.push_str(&format!(
            "\nSummary: {} alarm, {} ok, {} info, {} skip, {} error\n",
            summary.alarm, summary.ok, summary.info, summary.skip, summary.error
        ));

        let severity = tree.node(tree.root()).severity_summary();
        if !severity.is_empty() {
            let parts: Vec<String> = severity
                .counts()
                .map(|(severity, count)| format!("{severity}: {count}"))
                .collect();
            out.push_str(&format!("Severity alarms: {}\n", parts.join(", ")));
        }

        Ok(out)
    }
}

fn render_node(tree: &ExecutionTree, id: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match tree.node(id) {
        Node::Benchmark(b) => {
            out.push_str(&format!(
                "{}{} [{} alarm, {} ok, {} error]\n",
                indent, b.title, b.summary.alarm, b.summary.ok, b.summary.error
            ));
            for child in &b.children {
                render_node(tree, *child, depth + 1, out);
            }
        }
        Node::Control(c) => {
            let marker = if let Some(error) = &c.error {
                format!("ERROR ({error})")
            } else if c.summary.alarm > 0 {
                "ALARM".to_string()
            } else {
                "OK".to_string()
            };
            out.push_str(&format!(
                "{}{} {} ({}ms)\n",
                indent, marker, c.title, c.duration_ms
            ));
            for result in &c.results {
                let label = match result.status {
                    Status::Empty => "no matching resources".to_string(),
                    status => format!(
                        "{}: {} {}",
                        status,
                        result.resource,
                        result.reason
                    ),
                };
                out.push_str(&format!("{}  - {}\n", indent, label.trim_end()));
            }
        }
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

    #[tokio::test]
    async fn test_text_report_structure() {
        let mut catalog = Catalog::new();
        catalog
            .add_benchmark(
                BenchmarkDefinition::new("bench", "My Benchmark")
                    .control(ControlDefinition::new("c1", "First Control", "select 1")),
            )
            .unwrap();

        let executor = MockExecutor::new().respond(
            "select 1",
            MockResponse::statuses(vec![("alarm", "server-1", "port open")]),
        );

        let mut tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();
        tree.execute(
            Arc::new(executor),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let report = TextFormatter.format(&tree).unwrap();
        assert!(report.contains("Status: FAILED"));
        assert!(report.contains("My Benchmark [1 alarm, 0 ok, 0 error]"));
        assert!(report.contains("ALARM First Control"));
        assert!(report.contains("alarm: server-1 port open"));
        assert!(report.contains("Summary: 1 alarm, 0 ok, 0 info, 0 skip, 0 error"));
    }

    #[test]
    fn test_refuses_incomplete_tree() {
        let mut catalog = Catalog::new();
        catalog
            .add_control(ControlDefinition::new("c1", "C1", "select 1"))
            .unwrap();
        let tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();

        assert!(matches!(
            TextFormatter.format(&tree),
            Err(ExportError::IncompleteTree)
        ));
    }
}
