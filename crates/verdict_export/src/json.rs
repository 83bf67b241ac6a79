//! JSON snapshot formatter.

use verdict_core::ExecutionTree;

use crate::error::ExportResult;
use crate::formatter::Formatter;
use crate::snapshot::Snapshot;

/// Renders the tree as a pretty-printed JSON snapshot.
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn format(&self, tree: &ExecutionTree) -> ExportResult<String> {
        let snapshot = Snapshot::from_tree(tree)?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use verdict_catalog::{Catalog, ControlDefinition, RunFilter, Target};
    use verdict_core::RunOptions;
    use verdict_query::{MockExecutor, MockResponse};

    #[tokio::test]
    async fn test_json_output_is_a_snapshot() {
        let mut catalog = Catalog::new();
        catalog
            .add_control(ControlDefinition::new("c1", "C1", "select 1"))
            .unwrap();

        let executor = MockExecutor::new()
            .respond("select 1", MockResponse::statuses(vec![("ok", "r", "fine")]));

        let mut tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None).unwrap();
        tree.execute(
            Arc::new(executor),
            &RunOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let json = JsonFormatter.format(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], "1");
        assert_eq!(value["summary"]["ok"], 1);
    }
}
