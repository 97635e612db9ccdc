//! Binding generator invocation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::ProcessRunner;

/// One invocation of the external binding generator.
pub struct GeneratorCommand {
    /// Generator executable (absolute, or resolvable from PATH).
    pub executable: PathBuf,
    /// Root module name of the produced bindings.
    pub module_name: String,
    /// The aggregated include-closure file.
    pub closure_file: PathBuf,
    /// Output/prefix directory the generator writes into.
    pub output_dir: PathBuf,
    /// Generator config file.
    pub config_file: PathBuf,
    /// Extra flags passed through verbatim (e.g. `--trace`).
    pub extra_flags: Vec<String>,
    /// Include paths for the compiler half of the invocation: project
    /// sources, platform headers and the binding library headers.
    pub include_dirs: Vec<PathBuf>,
}

impl GeneratorCommand {
    fn command_line(&self) -> Vec<String> {
        let mut command = vec![
            self.executable.display().to_string(),
            "--root-module".to_string(),
            self.module_name.clone(),
            "--prefix".to_string(),
            self.output_dir.display().to_string(),
        ];
        command.extend(self.extra_flags.iter().cloned());
        command.push("--config".to_string());
        command.push(self.config_file.display().to_string());
        command.push(self.closure_file.display().to_string());
        // Everything past `--` goes to the in-process compiler.
        command.push("--".to_string());
        command.push("-std=c++11".to_string());
        for dir in &self.include_dirs {
            command.push(format!("-I{}", dir.display()));
        }
        command.push("-DNDEBUG".to_string());
        command.push("-v".to_string());
        command
    }

    /// Path of the manifest the generator writes on success.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.sources", self.module_name))
    }

    /// Run the generator and return the validated generated-source list.
    pub fn run(&self, runner: &ProcessRunner) -> Result<Vec<PathBuf>> {
        runner.run(&self.command_line(), None)?;
        read_manifest(&self.manifest_path())
    }
}

/// Read a generated-source manifest, one path per line.
///
/// Any duplicate entry is fatal: it means the module shares a name with one
/// of the bound namespaces or classes and the generator overwrote its own
/// output. Caught here, before it becomes a silent miscompile.
pub fn read_manifest(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::MissingArtifact(format!(
            "generator produced no manifest at {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)?;
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !seen.insert(line.to_string()) {
            return Err(Error::NameCollision(line.to_string()));
        }
        sources.push(PathBuf::from(line));
    }
    Ok(sources)
}
