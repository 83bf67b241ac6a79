//! Regrouping: alternate display views over a completed tree's results.
//!
//! Flattens every check result into one sequence, then partitions it
//! recursively by the requested grouping keys. The output is an ephemeral
//! [`DisplayGroup`] tree holding result references; the source tree is never
//! mutated.

use std::collections::HashMap;

use serde::Serialize;

use crate::node::NodeId;
use crate::result::CheckResult;
use crate::status::Status;
use crate::summary::{CheckSummary, SeveritySummary};
use crate::tree::ExecutionTree;

/// One level of grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupType {
    /// Ancestor benchmark path of the owning control
    Benchmark,
    /// Owning control name
    Control,
    /// Value of one result tag
    Tag(String),
    /// Value of one result dimension
    Dimension(String),
    /// Result severity
    Severity,
    /// Result status
    Status,
    /// No further split; results attach here
    Result,
}

impl GroupType {
    /// Parse a grouping key as given on the command line.
    ///
    /// Tag and dimension groupings carry their key: `tag:service`,
    /// `dimension:region`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if let Some(key) = raw.strip_prefix("tag:") {
            if key.is_empty() {
                return Err("empty tag key in grouping".to_string());
            }
            return Ok(GroupType::Tag(key.to_string()));
        }
        if let Some(key) = raw.strip_prefix("dimension:") {
            if key.is_empty() {
                return Err("empty dimension key in grouping".to_string());
            }
            return Ok(GroupType::Dimension(key.to_string()));
        }
        match raw {
            "benchmark" => Ok(GroupType::Benchmark),
            "control" => Ok(GroupType::Control),
            "severity" => Ok(GroupType::Severity),
            "status" => Ok(GroupType::Status),
            "result" => Ok(GroupType::Result),
            other => Err(format!("unknown grouping '{other}'")),
        }
    }

    /// Label used for this grouping level in rendered output.
    pub fn label(&self) -> String {
        match self {
            GroupType::Benchmark => "benchmark".to_string(),
            GroupType::Control => "control".to_string(),
            GroupType::Tag(key) => format!("tag:{key}"),
            GroupType::Dimension(key) => format!("dimension:{key}"),
            GroupType::Severity => "severity".to_string(),
            GroupType::Status => "status".to_string(),
            GroupType::Result => "result".to_string(),
        }
    }
}

/// Non-owning reference to a result inside the source tree.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ResultRef {
    pub control: NodeId,
    pub index: usize,
}

/// A node of the regrouped view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisplayGroup {
    /// Grouping level label, e.g. `severity` or `tag:service`
    pub group_type: String,
    /// Partition key; absent attributes bucket under the empty string
    pub key: String,
    /// Summary recomputed over this partition's member results
    pub summary: CheckSummary,
    pub severity_summary: SeveritySummary,
    pub children: Vec<DisplayGroup>,
    /// Member results, populated on leaf groups only
    pub results: Vec<ResultRef>,
}

/// Build an alternate grouped view over a tree's flattened results.
///
/// Partitions are emitted in first-seen order of their key within the
/// flattened sequence. Running this twice with the same spec yields
/// structurally identical output; the source tree is untouched.
pub fn regroup(tree: &ExecutionTree, groups: &[GroupType]) -> DisplayGroup {
    let members: Vec<(ResultRef, &CheckResult)> = flatten(tree);
    build_group(tree, "root".to_string(), "root".to_string(), members, groups)
}

fn flatten(tree: &ExecutionTree) -> Vec<(ResultRef, &CheckResult)> {
    let mut members = Vec::new();
    for id in tree.control_ids_depth_first() {
        if let Some(control) = tree.node(id).as_control() {
            for (index, result) in control.results.iter().enumerate() {
                members.push((ResultRef { control: id, index }, result));
            }
        }
    }
    members
}

fn build_group<'a>(
    tree: &'a ExecutionTree,
    group_type: String,
    key: String,
    members: Vec<(ResultRef, &'a CheckResult)>,
    remaining: &[GroupType],
) -> DisplayGroup {
    let mut summary = CheckSummary::default();
    let mut severity_summary = SeveritySummary::default();
    for (_, result) in &members {
        summary.record(result.status);
        if result.status == Status::Alarm {
            if let Some(severity) = result.severity {
                severity_summary.record_alarm(severity);
            }
        }
    }

    let Some((next, rest)) = remaining.split_first() else {
        return DisplayGroup {
            group_type,
            key,
            summary,
            severity_summary,
            children: Vec::new(),
            results: members.into_iter().map(|(r, _)| r).collect(),
        };
    };

    if *next == GroupType::Result {
        return DisplayGroup {
            group_type,
            key,
            summary,
            severity_summary,
            children: Vec::new(),
            results: members.into_iter().map(|(r, _)| r).collect(),
        };
    }

    // partition in first-seen key order
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<(ResultRef, &CheckResult)>> = HashMap::new();
    for (reference, result) in members {
        let key = group_key(tree, result, next);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push((reference, result));
    }

    let children = order
        .into_iter()
        .map(|key| {
            let members = buckets.remove(&key).unwrap_or_default();
            build_group(tree, next.label(), key, members, rest)
        })
        .collect();

    DisplayGroup {
        group_type,
        key,
        summary,
        severity_summary,
        children,
        results: Vec::new(),
    }
}

fn group_key(tree: &ExecutionTree, result: &CheckResult, group: &GroupType) -> String {
    match group {
        GroupType::Benchmark => tree.benchmark_path(result.control).join("/"),
        GroupType::Control => tree.node(result.control).name().to_string(),
        GroupType::Tag(key) => result.tags.get(key).cloned().unwrap_or_default(),
        GroupType::Dimension(key) => result.dimension(key).unwrap_or_default().to_string(),
        GroupType::Severity => result
            .severity
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        GroupType::Status => result.status.as_str().to_string(),
        GroupType::Result => String::new(),
    }
}
