//! # verdict_catalog
//!
//! Control and benchmark catalog for Verdict.
//!
//! This crate holds the definition model the engine executes against: named
//! controls backed by queries, benchmarks grouping them into a hierarchy, the
//! [`CatalogSource`] resolution contract, and the run filters that prune
//! controls at build time.
//!
//! ## Example
//!
//! ```rust
//! use verdict_catalog::{
//!     BenchmarkDefinition, Catalog, CatalogSource, ControlDefinition, Severity, Target,
//! };
//!
//! let mut catalog = Catalog::new();
//! catalog
//!     .add_benchmark(
//!         BenchmarkDefinition::new("storage", "Storage Checks").control(
//!             ControlDefinition::new("buckets_encrypted", "Buckets encrypted", "select * from buckets")
//!                 .with_severity(Severity::High),
//!         ),
//!     )
//!     .unwrap();
//!
//! let tree = catalog.resolve(&Target::Benchmark("storage".to_string())).unwrap();
//! assert_eq!(tree.roots.len(), 1);
//! ```

pub mod catalog;
pub mod error;
pub mod filter;
pub mod models;

pub use catalog::{Catalog, CatalogSource};
pub use error::{CatalogError, CatalogResult};
pub use filter::{RunFilter, TagFilter, WhereExpr};
pub use models::{
    BenchmarkDefinition, CatalogEntry, ControlDefinition, ResolvedTree, Severity, Target,
};
