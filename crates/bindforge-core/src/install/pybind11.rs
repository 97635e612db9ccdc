//! Installer for the generic binding library (pybind11).
//!
//! Header-only: staging is the whole job, there is no build step.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::paths::copy_tree;
use crate::process::{ProcessRunner, argv};

use super::source_spec::SourceSpec;
use super::staged::{EnvContribution, StagedInstaller, ensure_provenance};

/// Default upstream for the binding library.
pub const DEFAULT_PYBIND11_REMOTE: &str = "https://github.com/RosettaCommons/pybind11.git";

/// The pinned sha known to work with the generator's output.
pub const SUPPORTED_PYBIND11_SHA: &str = "32c4d7e17f267e10e71138a78d559b1eef17c909";

/// Stages the pybind11 tree and reports its include directory.
pub struct Pybind11Installer {
    spec: SourceSpec,
    target_dir: PathBuf,
    git_remote: String,
    runner: ProcessRunner,
}

impl Pybind11Installer {
    pub fn new(spec: SourceSpec, target_dir: PathBuf, runner: ProcessRunner) -> Self {
        Self {
            spec,
            target_dir,
            git_remote: DEFAULT_PYBIND11_REMOTE.to_string(),
            runner,
        }
    }

    /// Override the upstream git URL.
    pub fn with_git_remote(mut self, url: impl Into<String>) -> Self {
        self.git_remote = url.into();
        self
    }

    /// The header directory handed to the generator and the build.
    pub fn include_dir(&self) -> PathBuf {
        self.target_dir.join("include")
    }

    /// Fetch a single pinned commit without cloning the full history.
    fn fetch_pinned(&self, sha: &str) -> Result<()> {
        fs::create_dir_all(&self.target_dir)?;
        let cwd = Some(self.target_dir.as_path());
        self.runner.run(&argv("git init"), cwd)?;
        self.runner.run(
            &argv(&format!("git remote add origin {}", self.git_remote)),
            cwd,
        )?;
        self.runner
            .run(&argv(&format!("git fetch --depth 1 origin {}", sha)), cwd)?;
        self.runner.run(&argv("git checkout FETCH_HEAD"), cwd)
    }
}

impl StagedInstaller for Pybind11Installer {
    fn name(&self) -> &'static str {
        "pybind11"
    }

    fn stage(&self) -> Result<()> {
        if self.include_dir().is_dir() {
            tracing::debug!("pybind11 already staged at {}", self.target_dir.display());
            return ensure_provenance(&self.target_dir, &self.spec.identity());
        }

        match &self.spec {
            SourceSpec::Local(source) => copy_tree(source, &self.target_dir)?,
            SourceSpec::Pinned(sha) => self.fetch_pinned(sha)?,
        }

        if !self.include_dir().is_dir() {
            return Err(Error::MissingArtifact(format!(
                "pybind11 staging produced no include directory at {}",
                self.include_dir().display()
            )));
        }
        ensure_provenance(&self.target_dir, &self.spec.identity())
    }

    fn build(&self) -> Result<Vec<EnvContribution>> {
        // Header-only, nothing to compile.
        Ok(vec![
            (
                "PYBIND11_INCLUDE_DIR".to_string(),
                self.include_dir().display().to_string(),
            ),
            ("PYBIND11_SHA".to_string(), self.spec.identity()),
        ])
    }
}
