//! List command - show the catalog's benchmarks and controls.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use verdict_catalog::{Catalog, CatalogEntry};

use crate::ExitCodes;

#[derive(Args)]
pub struct ListArgs {
    /// Path to the catalog file
    #[arg(short, long, default_value = "catalog.yaml", env = "VERDICT_CATALOG")]
    catalog: PathBuf,
}

pub async fn execute(args: ListArgs) -> Result<u8> {
    let catalog = Catalog::from_file(&args.catalog)
        .with_context(|| format!("Failed to load catalog from {:?}", args.catalog))?;

    if catalog.is_empty() {
        println!("Catalog is empty");
        return Ok(ExitCodes::SUCCESS);
    }

    for entry in catalog.roots() {
        print_entry(entry, 0);
    }
    println!();
    println!("{} controls total", catalog.control_names().len());

    Ok(ExitCodes::SUCCESS)
}

fn print_entry(entry: &CatalogEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    match entry {
        CatalogEntry::Benchmark(b) => {
            println!("{}{} - {}", indent, b.name, b.title);
            for child in &b.children {
                print_entry(child, depth + 1);
            }
        }
        CatalogEntry::Control(c) => {
            let severity = c
                .severity
                .map(|s| format!(" [{s}]"))
                .unwrap_or_default();
            let tags = if c.tags.is_empty() {
                String::new()
            } else {
                let mut pairs: Vec<String> =
                    c.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
                pairs.sort_unstable();
                format!(" ({})", pairs.join(", "))
            };
            println!("{}{} - {}{}{}", indent, c.name, c.title, severity, tags);
        }
    }
}
