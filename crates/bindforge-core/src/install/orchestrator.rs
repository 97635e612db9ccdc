//! Installation orchestration and the environment descriptor.
//!
//! The orchestrator composes the installers in dependency order: the
//! generator's sources must be staged before the toolchain is configured
//! (its build manifest is patched to reference them), while the header-only
//! binding library has no ordering constraint. After all installers run,
//! their contributions are assembled into a single descriptor file — the
//! sole contract boundary between installation and generation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::InstallLayout;
use crate::process::ProcessRunner;

use super::compiler::BuildConfiguration;
use super::generator::GeneratorInstaller;
use super::llvm::LlvmInstaller;
use super::pybind11::Pybind11Installer;
use super::source_spec::SourceSpec;
use super::staged::{EnvContribution, StagedInstaller};

/// An ordered `KEY=VALUE` mapping, append-only during a run.
///
/// Keys from different installers must not collide; a collision is a defect
/// in the installer set, not a recoverable runtime state.
#[derive(Debug, Default)]
pub struct EnvironmentDescriptor {
    entries: Vec<EnvContribution>,
}

impl EnvironmentDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry, rejecting duplicate keys.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.get(&key).is_some() {
            return Err(Error::Validation(format!(
                "environment descriptor key '{}' contributed twice",
                key
            )));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Append a batch of contributions in order.
    pub fn extend(&mut self, contributions: Vec<EnvContribution>) -> Result<()> {
        for (key, value) in contributions {
            self.append(key, value)?;
        }
        Ok(())
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All entries in contribution order.
    pub fn entries(&self) -> &[EnvContribution] {
        &self.entries
    }

    /// Write newline-separated `KEY=VALUE` lines.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        for (key, value) in &self.entries {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Parse a descriptor file. Unknown keys are kept verbatim; consumers
    /// pick out what they need.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut descriptor = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => descriptor.append(key, value)?,
                None => {
                    tracing::warn!("ignoring malformed descriptor line: {}", line);
                }
            }
        }
        Ok(descriptor)
    }
}

/// Everything needed to drive one installation run.
pub struct InstallOptions {
    pub build_dir: PathBuf,
    pub binder: SourceSpec,
    pub llvm: SourceSpec,
    pub pybind11: SourceSpec,
    pub compiler: BuildConfiguration,
    pub jobs: usize,
    /// Upstream URL overrides.
    pub binder_git_url: Option<String>,
    pub llvm_git_url: Option<String>,
    pub pybind11_git_url: Option<String>,
    /// Dynamic-linker drop-in directory override.
    pub ldconfig_dir: Option<PathBuf>,
}

/// Sequences the installers and assembles the final descriptor file.
pub struct InstallationOrchestrator {
    layout: InstallLayout,
    installers: Vec<Box<dyn StagedInstaller>>,
}

impl InstallationOrchestrator {
    /// Build the fixed, dependency-ordered installer list.
    pub fn new(options: InstallOptions, runner: ProcessRunner) -> Result<Self> {
        let layout = InstallLayout::new(&options.build_dir)?;

        let mut generator = GeneratorInstaller::new(
            options.binder,
            layout.binder_dir.clone(),
            runner.clone(),
        );
        if let Some(url) = options.binder_git_url {
            generator = generator.with_git_remote(url);
        }
        let generator_source_dir = generator.source_dir();

        let mut pybind11 = Pybind11Installer::new(
            options.pybind11,
            layout.pybind11_dir.clone(),
            runner.clone(),
        );
        if let Some(url) = options.pybind11_git_url {
            pybind11 = pybind11.with_git_remote(url);
        }

        let mut llvm = LlvmInstaller::new(
            options.llvm,
            options.compiler,
            generator_source_dir,
            layout.llvm_dir.clone(),
            options.jobs,
            runner,
        );
        if let Some(url) = options.llvm_git_url {
            llvm = llvm.with_git_remote(url);
        }
        if let Some(dir) = options.ldconfig_dir {
            llvm = llvm.with_ldconfig_dir(dir);
        }

        // The generator must be staged before the toolchain configure sees
        // it; the binding library is unconstrained but staged up front too.
        let installers: Vec<Box<dyn StagedInstaller>> =
            vec![Box::new(generator), Box::new(pybind11), Box::new(llvm)];

        Ok(Self { layout, installers })
    }

    /// Path of the descriptor file this run will write.
    pub fn envfile(&self) -> &Path {
        &self.layout.envfile
    }

    /// Stage every installer without building (dry-run / pre-fetch).
    pub fn prepare(&self) -> Result<()> {
        for installer in &self.installers {
            tracing::info!("preparing {}", installer.name());
            installer.prepare()?;
        }
        Ok(())
    }

    /// Run every installer in order and write the descriptor file.
    pub fn install(&self) -> Result<EnvironmentDescriptor> {
        let mut descriptor = EnvironmentDescriptor::new();
        for installer in &self.installers {
            tracing::info!("installing {}", installer.name());
            descriptor.extend(installer.install()?)?;
        }
        descriptor.write_to(&self.layout.envfile)?;
        tracing::info!("wrote {}", self.layout.envfile.display());
        Ok(descriptor)
    }
}
