//! CLI command definitions.
//!
//! This module defines the command structure for the Verdict CLI.

use clap::{Parser, Subcommand};

pub mod list;
pub mod run;

/// Verdict - compliance control execution engine
#[derive(Parser)]
#[command(name = "verdict")]
#[command(version, about = "Verdict - compliance control execution engine")]
#[command(long_about = r#"
Verdict evaluates hierarchies of compliance controls against recorded query
results and produces aggregated pass/fail reports.

COMMANDS:
  run   → Execute a benchmark, a control, or the whole catalog
  list  → Show the catalog's benchmarks and controls

EXIT CODES:
  0 - Success, no alarms or errors
  1 - One or more control alarms
  2 - One or more control errors
  3 - Invalid arguments or filter
  4 - Catalog or target error
  5 - Runtime failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a benchmark, a control, or 'all'
    Run(run::RunArgs),

    /// List the catalog's benchmarks and controls
    List(list::ListArgs),
}
