//! Installer for the binding generator's sources.
//!
//! The generator (binder) is not built on its own: its sources are staged so
//! the toolchain bootstrap can graft them into the clang-tools-extra tree and
//! build them as a toolchain subproject. Staging must therefore happen before
//! the toolchain is configured.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{ProcessRunner, argv};

use super::source_spec::SourceSpec;
use super::staged::{EnvContribution, StagedInstaller, ensure_provenance};

/// Default upstream for the generator.
pub const DEFAULT_BINDER_REMOTE: &str = "https://github.com/RosettaCommons/binder.git";

/// Stages the generator checkout (a shallow branch clone, or a local tree
/// used in place).
pub struct GeneratorInstaller {
    spec: SourceSpec,
    clone_dir: PathBuf,
    git_remote: String,
    runner: ProcessRunner,
}

impl GeneratorInstaller {
    pub fn new(spec: SourceSpec, clone_dir: PathBuf, runner: ProcessRunner) -> Self {
        Self {
            spec,
            clone_dir,
            git_remote: DEFAULT_BINDER_REMOTE.to_string(),
            runner,
        }
    }

    /// Override the upstream git URL.
    pub fn with_git_remote(mut self, url: impl Into<String>) -> Self {
        self.git_remote = url.into();
        self
    }

    /// Root of the generator checkout.
    pub fn root_dir(&self) -> &Path {
        match &self.spec {
            SourceSpec::Pinned(_) => &self.clone_dir,
            SourceSpec::Local(path) => path,
        }
    }

    /// The `source` subtree the toolchain build incorporates.
    pub fn source_dir(&self) -> PathBuf {
        self.root_dir().join("source")
    }
}

impl StagedInstaller for GeneratorInstaller {
    fn name(&self) -> &'static str {
        "generator"
    }

    fn stage(&self) -> Result<()> {
        match &self.spec {
            SourceSpec::Local(path) => {
                // Used in place, nothing to clone.
                if !path.join("source").is_dir() {
                    return Err(Error::MissingArtifact(format!(
                        "generator source tree '{}' has no source/ subdirectory",
                        path.display()
                    )));
                }
                Ok(())
            }
            SourceSpec::Pinned(branch) => {
                if self.clone_dir.is_dir() {
                    tracing::debug!(
                        "generator already staged at {}",
                        self.clone_dir.display()
                    );
                    return ensure_provenance(&self.clone_dir, &self.spec.identity());
                }
                self.runner.run(
                    &argv(&format!(
                        "git clone --depth 1 --branch {} {} {}",
                        branch,
                        self.git_remote,
                        self.clone_dir.display()
                    )),
                    None,
                )?;
                ensure_provenance(&self.clone_dir, &self.spec.identity())
            }
        }
    }

    fn build(&self) -> Result<Vec<EnvContribution>> {
        // Built as part of the toolchain bootstrap, not here.
        Ok(vec![(
            "BINDER_SOURCE_DIR".to_string(),
            self.source_dir().display().to_string(),
        )])
    }
}
