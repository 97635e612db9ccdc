//! Include closure collection.
//!
//! The generator consumes a single header aggregating every include
//! directive found across the project's sources. The closure is deduplicated
//! and sorted so the output is always the same and doesn't depend on
//! filesystem state — inconsistent orderings cause inconsistent generator
//! output downstream.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions enumerated when scanning a project source tree.
const SOURCE_EXTENSIONS: &[&str] = &["hpp", "cpp", "h", "hh", "cc", "c"];

/// Recursively enumerate the source files of the given project trees.
///
/// The result is sorted, so downstream output never depends on directory
/// enumeration order.
pub fn collect_project_sources(project_dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in project_dirs {
        for ext in SOURCE_EXTENSIONS {
            let pattern = format!("{}/**/*.{}", dir.display(), ext);
            let paths = glob::glob(&pattern)
                .map_err(|e| Error::Validation(format!("bad source pattern '{}': {}", pattern, e)))?;
            for entry in paths {
                files.push(entry.map_err(|e| Error::Io(e.into_error()))?);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Collects the deduplicated, sorted set of include directives from a list
/// of source files.
pub struct IncludeClosureCollector {
    /// Lines containing any of these substrings are suppressed (unstable or
    /// environment-specific includes).
    ignore_words: Vec<String>,
}

impl IncludeClosureCollector {
    pub fn new(ignore_words: Vec<String>) -> Self {
        Self { ignore_words }
    }

    /// Extract the include closure from the given files.
    pub fn collect(&self, files: &[PathBuf]) -> Result<BTreeSet<String>> {
        let mut closure = BTreeSet::new();
        for file in files {
            let text = fs::read_to_string(file)?;
            for line in text.lines() {
                if line.starts_with("#include")
                    && !self.ignore_words.iter().any(|word| line.contains(word))
                {
                    closure.insert(line.trim().to_string());
                }
            }
        }
        Ok(closure)
    }

    /// Collect and write the closure, one directive per line, sorted.
    pub fn write_closure(&self, files: &[PathBuf], out: &Path) -> Result<()> {
        let closure = self.collect(files)?;
        let mut handle = fs::File::create(out)?;
        for include in &closure {
            writeln!(handle, "{}", include)?;
        }
        tracing::info!("wrote {} include directives to {}", closure.len(), out.display());
        Ok(())
    }
}
