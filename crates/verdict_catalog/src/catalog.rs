//! Catalog storage and target resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{BenchmarkDefinition, CatalogEntry, ControlDefinition, ResolvedTree, Target};

/// A source of control and benchmark definitions.
///
/// The engine only ever sees this trait; the shipped [`Catalog`] is an
/// in-memory implementation loaded from YAML, but a mod/workspace resolver
/// can stand behind the same contract.
pub trait CatalogSource: Send + Sync {
    /// Resolve a target into its ordered definition tree.
    ///
    /// Fails with [`CatalogError::TargetNotFound`] if the target names
    /// nothing in this catalog.
    fn resolve(&self, target: &Target) -> CatalogResult<ResolvedTree>;
}

/// On-disk catalog file shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    benchmarks: Vec<BenchmarkDefinition>,
    #[serde(default)]
    controls: Vec<ControlDefinition>,
}

fn default_version() -> String {
    "1".to_string()
}

/// An in-memory catalog of benchmark and control definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Top-level entries in declared order
    roots: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        debug!("Loading catalog from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a catalog from YAML content.
    pub fn from_yaml(content: &str) -> CatalogResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let mut catalog = Self::new();
        for benchmark in file.benchmarks {
            catalog.add_benchmark(benchmark)?;
        }
        for control in file.controls {
            catalog.add_control(control)?;
        }
        Ok(catalog)
    }

    /// Add a top-level benchmark.
    pub fn add_benchmark(&mut self, benchmark: BenchmarkDefinition) -> CatalogResult<()> {
        self.check_duplicates(&CatalogEntry::Benchmark(benchmark.clone()))?;
        self.roots.push(CatalogEntry::Benchmark(benchmark));
        Ok(())
    }

    /// Add a top-level standalone control.
    pub fn add_control(&mut self, control: ControlDefinition) -> CatalogResult<()> {
        self.check_duplicates(&CatalogEntry::Control(control.clone()))?;
        self.roots.push(CatalogEntry::Control(control));
        Ok(())
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Top-level entries in declared order.
    pub fn roots(&self) -> &[CatalogEntry] {
        &self.roots
    }

    /// Names of every control in the catalog, in declared order.
    pub fn control_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for root in &self.roots {
            collect_control_names(root, &mut names);
        }
        names
    }

    fn check_duplicates(&self, entry: &CatalogEntry) -> CatalogResult<()> {
        let mut incoming = Vec::new();
        collect_names(entry, &mut incoming);
        let mut existing = Vec::new();
        for root in &self.roots {
            collect_names(root, &mut existing);
        }
        for name in incoming {
            if existing.contains(&name) {
                return Err(CatalogError::DuplicateName(name.to_string()));
            }
        }
        Ok(())
    }

    fn find(&self, target: &Target) -> Option<CatalogEntry> {
        let (name, want_benchmark) = match target {
            Target::All => return None,
            Target::Benchmark(name) => (name, true),
            Target::Control(name) => (name, false),
        };
        for root in &self.roots {
            if let Some(found) = find_entry(root, name, want_benchmark) {
                return Some(found.clone());
            }
        }
        None
    }
}

impl CatalogSource for Catalog {
    fn resolve(&self, target: &Target) -> CatalogResult<ResolvedTree> {
        match target {
            Target::All => Ok(ResolvedTree {
                roots: self.roots.clone(),
            }),
            _ => {
                let entry = self
                    .find(target)
                    .ok_or_else(|| CatalogError::TargetNotFound(target.name().to_string()))?;
                Ok(ResolvedTree { roots: vec![entry] })
            }
        }
    }
}

fn find_entry<'a>(
    entry: &'a CatalogEntry,
    name: &str,
    want_benchmark: bool,
) -> Option<&'a CatalogEntry> {
    match entry {
        CatalogEntry::Benchmark(b) => {
            if want_benchmark && b.name == name {
                return Some(entry);
            }
            b.children
                .iter()
                .find_map(|child| find_entry(child, name, want_benchmark))
        }
        CatalogEntry::Control(c) => {
            if !want_benchmark && c.name == name {
                Some(entry)
            } else {
                None
            }
        }
    }
}

fn collect_names<'a>(entry: &'a CatalogEntry, names: &mut Vec<&'a str>) {
    names.push(entry.name());
    if let CatalogEntry::Benchmark(b) = entry {
        for child in &b.children {
            collect_names(child, names);
        }
    }
}

fn collect_control_names<'a>(entry: &'a CatalogEntry, names: &mut Vec<&'a str>) {
    match entry {
        CatalogEntry::Control(c) => names.push(&c.name),
        CatalogEntry::Benchmark(b) => {
            for child in &b.children {
                collect_control_names(child, names);
            }
        }
    }
}
