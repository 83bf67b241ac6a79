//! Verdict CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success, no alarms or errors
//! - 1: One or more control alarms
//! - 2: One or more control errors
//! - 3: Invalid arguments or filter
//! - 4: Catalog or target error
//! - 5: Runtime failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verdict_catalog::CatalogError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes for setup failures; run outcomes use the
/// summary-derived codes 0-2.
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const INVALID_ARGS: u8 = 3;
    pub const CATALOG_ERROR: u8 = 4;
    pub const RUNTIME_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("verdict=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::List(args) => commands::list::execute(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let catalog_error = e.downcast_ref::<CatalogError>().or_else(|| {
        match e.downcast_ref::<verdict_core::CoreError>() {
            Some(verdict_core::CoreError::Catalog(inner)) => Some(inner),
            _ => None,
        }
    });
    match catalog_error {
        Some(CatalogError::InvalidFilter(_)) | Some(CatalogError::WhereParse(_)) => {
            ExitCodes::INVALID_ARGS
        }
        Some(_) => ExitCodes::CATALOG_ERROR,
        None => match e.downcast_ref::<verdict_export::ExportError>() {
            Some(verdict_export::ExportError::UnknownFormat(_)) => ExitCodes::INVALID_ARGS,
            _ => ExitCodes::RUNTIME_ERROR,
        },
    }
}
