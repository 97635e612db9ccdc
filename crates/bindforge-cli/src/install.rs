//! The `bindforge install` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args};

use bindforge_core::install::{
    BuildConfiguration, InstallOptions, InstallationOrchestrator, SUGGESTED_LLVM_RELEASE,
    SUPPORTED_PYBIND11_SHA, SourceSpec,
};
use bindforge_core::process::ProcessRunner;

#[derive(Args)]
#[command(group(ArgGroup::new("binder").required(true).multiple(false)))]
pub struct InstallArgs {
    /// Output directory for the toolchain and its dependencies
    #[arg(long)]
    build_path: PathBuf,

    /// Number of processors to use when building, 0 = infer from this machine
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// CMake build mode (Release, Debug, MinSizeRel, RelWithDebInfo)
    #[arg(long, default_value = "Release")]
    build_mode: String,

    /// Compiler for the initial pass; pass 2 replaces it with the built clang
    #[arg(long, default_value = "clang")]
    compiler: String,

    /// Stage all sources but skip the build/install phase
    #[arg(long)]
    prepare_only: bool,

    /// pybind11 commit sha to fetch
    #[arg(long, conflicts_with = "pybind11_source")]
    pybind11_sha: Option<String>,

    /// Path to a local pybind11 source tree
    #[arg(long)]
    pybind11_source: Option<PathBuf>,

    /// llvm release to build
    #[arg(long, conflicts_with = "llvm_source")]
    llvm_version: Option<String>,

    /// Path to a local llvm source tree
    #[arg(long)]
    llvm_source: Option<PathBuf>,

    /// Binder branch to clone
    #[arg(long, group = "binder")]
    binder_branch: Option<String>,

    /// Path to a local binder tree (the whole checkout, not its source/ dir)
    #[arg(long, group = "binder")]
    binder_source: Option<PathBuf>,

    /// git url override for pybind11
    #[arg(long)]
    pybind11_git_url: Option<String>,

    /// git url override for binder
    #[arg(long)]
    binder_git_url: Option<String>,

    /// git url override for llvm
    #[arg(long)]
    llvm_git_url: Option<String>,
}

/// Resolve a version/source pair, falling back to a pinned default when
/// neither was given.
fn spec_with_default(
    version: Option<String>,
    source: Option<PathBuf>,
    default_version: &str,
) -> Result<SourceSpec> {
    let spec = match (version, source) {
        (None, None) => SourceSpec::new(Some(default_version.to_string()), None),
        (version, source) => SourceSpec::new(version, source),
    }?;
    Ok(spec)
}

pub fn run(args: InstallArgs) -> Result<()> {
    let jobs = if args.jobs == 0 {
        std::thread::available_parallelism()?.get()
    } else {
        args.jobs
    };

    let compiler = BuildConfiguration::new(args.compiler.parse()?, args.build_mode.parse()?);

    let options = InstallOptions {
        build_dir: args.build_path,
        binder: SourceSpec::new(args.binder_branch, args.binder_source)?,
        llvm: spec_with_default(args.llvm_version, args.llvm_source, SUGGESTED_LLVM_RELEASE)?,
        pybind11: spec_with_default(
            args.pybind11_sha,
            args.pybind11_source,
            SUPPORTED_PYBIND11_SHA,
        )?,
        compiler,
        jobs,
        binder_git_url: args.binder_git_url,
        llvm_git_url: args.llvm_git_url,
        pybind11_git_url: args.pybind11_git_url,
        ldconfig_dir: None,
    };

    let orchestrator = InstallationOrchestrator::new(options, ProcessRunner::new())?;

    if args.prepare_only {
        orchestrator.prepare()?;
        println!("prepared; re-run without --prepare-only to install");
    } else {
        orchestrator.install()?;
        println!("installed; environment written to {}", orchestrator.envfile().display());
    }
    Ok(())
}
