//! The `bindforge generate` subcommand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use bindforge_core::generate::{GenerateConfig, GenerationPipeline};
use bindforge_core::install::EnvironmentDescriptor;
use bindforge_core::process::ProcessRunner;

use crate::docker;

#[derive(Args)]
pub struct GenerateArgs {
    /// Directory to build/output the bindings and build tree; must be a
    /// direct child of the working directory
    #[arg(long)]
    pub output_directory: PathBuf,

    /// What you would like to call this module (ie- import module-name)
    #[arg(long)]
    pub module_name: String,

    /// The location of the project's source files
    #[arg(long, num_args = 1.., required = true)]
    pub project_sources: Vec<PathBuf>,

    /// Extra source directories needed to build the project
    #[arg(long, num_args = 1..)]
    pub source_directories_to_include: Vec<PathBuf>,

    /// Generator config file
    #[arg(long)]
    pub config_file: PathBuf,

    /// Extra binder flags; for debugging typically --trace --annotate-includes
    #[arg(long, default_value = "")]
    pub extra_binder_flags: String,

    /// Ignore include lines that have any of these words in them
    #[arg(long, num_args = 1..)]
    pub include_line_ignore_words: Vec<String>,

    /// Run this script through sh before generating
    #[arg(long)]
    pub preinstall_script: Option<PathBuf>,

    /// Use this pre-built include-closure file instead of collecting one
    #[arg(long)]
    pub custom_all_includes_file: Option<PathBuf>,

    /// Environment descriptor written by `bindforge install`; resolves the
    /// generator, compilers and pybind11 headers from the installation
    #[arg(long)]
    pub envfile: Option<PathBuf>,

    /// The location of the pybind11 source directory
    #[arg(long, required_unless_present_any = ["docker_image", "envfile"])]
    pub pybind11_source: Option<PathBuf>,

    /// Where binder is, if not in $PATH
    #[arg(long, default_value = "binder")]
    pub binder_executable: String,

    /// Platform header directory; probed from the Python installation when
    /// not given
    #[arg(long)]
    pub platform_include_dir: Option<PathBuf>,

    /// Re-invoke the same generation inside this container image
    #[arg(long)]
    pub docker_image: Option<String>,

    /// Build parallelism handed to the build tool
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

/// Paths resolved from the descriptor or the raw arguments.
struct ResolvedTools {
    generator: PathBuf,
    pybind11_source: PathBuf,
    cc: String,
    cxx: String,
}

/// Prefer the installation's descriptor; fall back to the raw arguments.
fn resolve_tools(args: &GenerateArgs) -> Result<ResolvedTools> {
    let descriptor = match &args.envfile {
        Some(path) => Some(
            EnvironmentDescriptor::load(path)
                .with_context(|| format!("reading environment descriptor {}", path.display()))?,
        ),
        None => None,
    };

    let bin_dir = descriptor
        .as_ref()
        .and_then(|d| d.get("LLVM_BIN_DIR"))
        .map(PathBuf::from);

    let generator = match &bin_dir {
        Some(bin) => bin.join("binder"),
        None => resolve_executable(&args.binder_executable)?,
    };
    let (cc, cxx) = match &bin_dir {
        Some(bin) => (
            bin.join("clang").display().to_string(),
            bin.join("clang++").display().to_string(),
        ),
        None => ("clang".to_string(), "clang++".to_string()),
    };

    let pybind11_source = match (&args.pybind11_source, &descriptor) {
        (Some(path), _) => path.clone(),
        (None, Some(d)) => d
            .get("PYBIND11_INCLUDE_DIR")
            .map(|include| Path::new(include).parent().unwrap_or(Path::new(include)).to_path_buf())
            .context("descriptor has no PYBIND11_INCLUDE_DIR")?,
        (None, None) => anyhow::bail!("--pybind11-source or --envfile is required"),
    };

    Ok(ResolvedTools {
        generator,
        pybind11_source,
        cc,
        cxx,
    })
}

/// A bare name is looked up on PATH; anything with a separator is a path.
fn resolve_executable(name: &str) -> Result<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        return Ok(PathBuf::from(name));
    }
    which::which(name).with_context(|| format!("unable to find {} in $PATH", name))
}

/// Probe the embedding runtime's header directory.
fn detect_platform_include(runner: &ProcessRunner) -> Option<PathBuf> {
    let probe = vec![
        "python3".to_string(),
        "-c".to_string(),
        "import sysconfig; print(sysconfig.get_paths()['include'])".to_string(),
    ];
    match runner.output(&probe, None) {
        Ok(out) => Some(PathBuf::from(out.stdout.trim())),
        Err(e) => {
            tracing::warn!("could not probe platform include dir: {}", e);
            None
        }
    }
}

pub fn run(args: GenerateArgs) -> Result<()> {
    if let Some(image) = args.docker_image.clone() {
        return docker::run_in_docker(&image, &args);
    }

    let runner = ProcessRunner::new();

    if let Some(script) = &args.preinstall_script {
        runner.run(
            &["sh".to_string(), script.display().to_string()],
            None,
        )?;
    }

    let tools = resolve_tools(&args)?;
    let platform_include_dir = args
        .platform_include_dir
        .clone()
        .or_else(|| detect_platform_include(&runner));

    let config = GenerateConfig {
        output_dir: args.output_directory,
        module_name: args.module_name,
        project_sources: args.project_sources,
        extra_include_dirs: args.source_directories_to_include,
        config_file: args.config_file,
        extra_generator_flags: args
            .extra_binder_flags
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        include_ignore_words: args.include_line_ignore_words,
        custom_closure_file: args.custom_all_includes_file,
        pybind11_source: tools.pybind11_source,
        platform_include_dir,
        generator_executable: tools.generator,
        cc: tools.cc,
        cxx: tools.cxx,
        jobs: args.jobs,
    };

    let artifact = GenerationPipeline::new(config, runner).run()?;
    println!("module built and verified: {}", artifact.display());
    Ok(())
}
