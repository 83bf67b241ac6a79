//! # verdict_core
//!
//! Execution tree engine for Verdict.
//!
//! Builds the hierarchical run structure from a catalog, executes controls
//! with bounded concurrency, classifies raw query rows into typed results,
//! propagates summaries and severity statistics bottom-up, and supports
//! regrouping the same result set into alternate display views.
//!
//! # Architecture
//!
//! - **Tree builder**: walks the catalog into an arena of benchmark/control
//!   nodes, applying where/tag filters
//! - **Control runner**: submits one control's query and classifies its
//!   streamed rows
//! - **Executor**: a fixed worker pool feeding a single aggregation loop
//!   that rolls summaries upward via fan-in counters
//! - **Regrouping**: partitions the flattened result set into an ephemeral
//!   display tree
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use verdict_catalog::{Catalog, RunFilter, Target};
//! use verdict_core::{exit_code, ExecutionTree, RunOptions};
//!
//! let catalog = Catalog::from_file("catalog.yaml")?;
//! let mut tree = ExecutionTree::build(&catalog, &Target::All, &RunFilter::None)?;
//! tree.execute(executor, &RunOptions::default(), CancellationToken::new()).await?;
//! std::process::exit(exit_code(tree.root_summary()) as i32);
//! ```

pub mod classify;
pub mod error;
pub mod execute;
pub mod exit;
pub mod group;
pub mod leaf;
pub mod node;
pub mod result;
pub mod runner;
pub mod status;
pub mod summary;
pub mod tree;

pub use classify::{classify, has_status_column, ClassifyContext};
pub use error::{CoreError, CoreResult};
pub use execute::{RunOptions, DEFAULT_MAX_PARALLEL};
pub use exit::{exit_code, EXIT_ALARMS, EXIT_ERRORS, EXIT_OK};
pub use group::{regroup, DisplayGroup, GroupType, ResultRef};
pub use leaf::LeafData;
pub use node::{BenchmarkNode, ControlNode, Node, NodeId, RunState};
pub use result::{CheckResult, Dimension};
pub use runner::{run_control, ControlOutcome, ControlTask};
pub use status::Status;
pub use summary::{CheckSummary, SeveritySummary};
pub use tree::{ExecutionTree, ROOT_NAME};
