//! Binding-generation pipeline.
//!
//! Sequential, blocking stages: enumerate project sources, aggregate the
//! include closure, invoke the generator, synthesize a build description,
//! compile with the external build tool and smoke-test that the produced
//! module loads. Any failing stage aborts the whole run.

mod cmake;
mod includes;
mod invoke;
mod verify;

pub use cmake::BuildDescription;
pub use includes::{IncludeClosureCollector, collect_project_sources};
pub use invoke::{GeneratorCommand, read_manifest};
pub use verify::{compile, find_module_artifact, module_extension, verify_loads};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::process::ProcessRunner;

/// Everything needed to drive one generation run.
pub struct GenerateConfig {
    /// Output directory the generator and build write into. Must be a
    /// direct child of the working directory: the build description lands
    /// in the working directory and the build tool configures against it
    /// from inside the output directory.
    pub output_dir: PathBuf,
    /// Name of the produced extension module.
    pub module_name: String,
    /// Project source trees to bind.
    pub project_sources: Vec<PathBuf>,
    /// Additional include directories for the build.
    pub extra_include_dirs: Vec<PathBuf>,
    /// Generator config file.
    pub config_file: PathBuf,
    /// Extra generator flags passed through verbatim.
    pub extra_generator_flags: Vec<String>,
    /// Include lines containing any of these substrings are suppressed.
    pub include_ignore_words: Vec<String>,
    /// Pre-built include-closure file; skips collection when set.
    pub custom_closure_file: Option<PathBuf>,
    /// The binding library source tree.
    pub pybind11_source: PathBuf,
    /// Platform header directory (the embedding runtime's headers).
    pub platform_include_dir: Option<PathBuf>,
    /// The generator executable.
    pub generator_executable: PathBuf,
    /// Compiler pair for the build tool's configure step.
    pub cc: String,
    pub cxx: String,
    /// Parallelism handed to the build tool.
    pub jobs: usize,
}

/// Drives the generation stages in order.
pub struct GenerationPipeline {
    config: GenerateConfig,
    runner: ProcessRunner,
}

impl GenerationPipeline {
    pub fn new(config: GenerateConfig, runner: ProcessRunner) -> Self {
        Self { config, runner }
    }

    /// The include paths handed to both the generator and the build:
    /// project sources, platform headers, binding library headers, extras.
    fn include_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.config.project_sources.clone();
        if let Some(platform) = &self.config.platform_include_dir {
            dirs.push(platform.clone());
        }
        dirs.push(self.config.pybind11_source.join("include"));
        dirs.extend(self.config.extra_include_dirs.iter().cloned());
        dirs
    }

    /// Run the full pipeline; returns the verified artifact path.
    pub fn run(&self) -> Result<PathBuf> {
        let config = &self.config;

        // Stale output poisons both the generator and the manifest check.
        if config.output_dir.exists() {
            fs::remove_dir_all(&config.output_dir)?;
        }
        fs::create_dir_all(&config.output_dir)?;

        let project_files = collect_project_sources(&config.project_sources)?;
        tracing::info!("found {} project source files", project_files.len());

        let closure_file = match &config.custom_closure_file {
            Some(path) => path.clone(),
            None => {
                let path = config.output_dir.join("all_includes.hpp");
                IncludeClosureCollector::new(config.include_ignore_words.clone())
                    .write_closure(&project_files, &path)?;
                path
            }
        };

        let generated = GeneratorCommand {
            executable: config.generator_executable.clone(),
            module_name: config.module_name.clone(),
            closure_file,
            output_dir: config.output_dir.clone(),
            config_file: config.config_file.clone(),
            extra_flags: config.extra_generator_flags.clone(),
            include_dirs: self.include_dirs(),
        }
        .run(&self.runner)?;
        tracing::info!("generator produced {} sources", generated.len());

        let description = BuildDescription {
            module_name: config.module_name.clone(),
            pybind11_source: config.pybind11_source.clone(),
            generated_sources: generated,
            project_sources: project_files,
            include_dirs: self.include_dirs(),
        };
        description.write_to(Path::new("CMakeLists.txt"))?;

        compile(
            &self.runner,
            &config.output_dir,
            &config.cc,
            &config.cxx,
            config.jobs,
        )?;
        verify_loads(&config.output_dir, &config.module_name)
    }
}
