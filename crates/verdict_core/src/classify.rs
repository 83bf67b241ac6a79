//! Row classification into typed check results.
//!
//! Column roles are resolved by name: `status` (required for the control as
//! a whole), `reason` and `resource` (optional free text). Every other
//! column becomes a dimension. Severity and tags come from the control
//! definition, never from the row.

use std::collections::HashMap;

use verdict_catalog::Severity;
use verdict_query::{ColumnDef, Row};

use crate::node::NodeId;
use crate::result::{CheckResult, Dimension};
use crate::status::Status;

/// Reserved column carrying the status label.
pub const STATUS_COLUMN: &str = "status";
/// Reserved column carrying the human-readable reason.
pub const REASON_COLUMN: &str = "reason";
/// Reserved column identifying the checked resource.
pub const RESOURCE_COLUMN: &str = "resource";

/// Control metadata attached to every classified result.
#[derive(Debug, Clone)]
pub struct ClassifyContext {
    pub control: NodeId,
    pub severity: Option<Severity>,
    pub tags: HashMap<String, String>,
}

/// Whether the given columns carry the required `status` column.
pub fn has_status_column(columns: &[ColumnDef]) -> bool {
    columns.iter().any(|c| c.name == STATUS_COLUMN)
}

/// Classify one row into a typed check result.
///
/// Callers must have verified [`has_status_column`] at stream start; a row
/// whose status cell is missing, non-textual or not one of the five valid
/// labels classifies as an `error` result with a descriptive reason rather
/// than failing the control.
pub fn classify(row: &Row, columns: &[ColumnDef], ctx: &ClassifyContext) -> CheckResult {
    let mut status = None;
    let mut invalid_status = None;
    let mut reason = String::new();
    let mut resource = String::new();
    let mut dimensions: Vec<Dimension> = Vec::new();

    for (column, value) in columns.iter().zip(row.values.iter()) {
        match column.name.as_str() {
            STATUS_COLUMN => match value.as_str() {
                Some(label) => match Status::parse(label) {
                    Some(parsed) => status = Some(parsed),
                    None => invalid_status = Some(format!("'{label}' is not a valid status")),
                },
                None => {
                    invalid_status = Some(format!("status value {value} is not a string"));
                }
            },
            REASON_COLUMN => reason = stringify(value),
            RESOURCE_COLUMN => resource = stringify(value),
            name => {
                // dimensions keep unique keys, first occurrence wins
                if !dimensions.iter().any(|d| d.key == name) {
                    dimensions.push(Dimension::new(name, stringify(value)));
                }
            }
        }
    }

    let status = match (status, invalid_status) {
        (Some(status), None) => status,
        (_, Some(message)) => {
            reason = message;
            Status::Error
        }
        (None, None) => {
            reason = "row has no status value".to_string();
            Status::Error
        }
    };

    CheckResult {
        status,
        reason,
        resource,
        dimensions,
        tags: ctx.tags.clone(),
        severity: ctx.severity,
        control: ctx.control,
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<ColumnDef> {
        names.iter().map(|n| ColumnDef::new(*n, "text")).collect()
    }

    fn ctx() -> ClassifyContext {
        ClassifyContext {
            control: NodeId(3),
            severity: Some(Severity::High),
            tags: HashMap::from([("service".to_string(), "s3".to_string())]),
        }
    }

    #[test]
    fn test_classify_basic_row() {
        let cols = columns(&["status", "resource", "reason"]);
        let row = Row::new(vec!["alarm".into(), "bucket-1".into(), "unencrypted".into()]);

        let result = classify(&row, &cols, &ctx());
        assert_eq!(result.status, Status::Alarm);
        assert_eq!(result.resource, "bucket-1");
        assert_eq!(result.reason, "unencrypted");
        assert_eq!(result.severity, Some(Severity::High));
        assert_eq!(result.tags["service"], "s3");
        assert_eq!(result.control, NodeId(3));
        assert!(result.dimensions.is_empty());
    }

    #[test]
    fn test_non_reserved_columns_become_dimensions() {
        let cols = columns(&["region", "status", "account_id"]);
        let row = Row::new(vec!["eu-west-1".into(), "ok".into(), serde_json::json!(42)]);

        let result = classify(&row, &cols, &ctx());
        assert_eq!(result.dimensions.len(), 2);
        assert_eq!(result.dimension("region"), Some("eu-west-1"));
        assert_eq!(result.dimension("account_id"), Some("42"));
    }

    #[test]
    fn test_invalid_status_label_is_error_result() {
        let cols = columns(&["status"]);
        let row = Row::new(vec!["broken".into()]);

        let result = classify(&row, &cols, &ctx());
        assert_eq!(result.status, Status::Error);
        assert!(result.reason.contains("not a valid status"));
    }

    #[test]
    fn test_non_string_status_is_error_result() {
        let cols = columns(&["status"]);
        let row = Row::new(vec![serde_json::json!(1)]);

        let result = classify(&row, &cols, &ctx());
        assert_eq!(result.status, Status::Error);
        assert!(result.reason.contains("not a string"));
    }

    #[test]
    fn test_short_row_missing_status_cell() {
        let cols = columns(&["resource", "status"]);
        let row = Row::new(vec!["r1".into()]);

        let result = classify(&row, &cols, &ctx());
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.reason, "row has no status value");
    }

    #[test]
    fn test_has_status_column() {
        assert!(has_status_column(&columns(&["a", "status"])));
        assert!(!has_status_column(&columns(&["a", "b"])));
    }
}
