//! Core engine for bindforge.
//!
//! This crate provides:
//! - Staged, resumable installation of the binding toolchain (generator
//!   sources, header-only binding library, two-pass compiler bootstrap)
//! - The environment descriptor handing resolved paths to later stages
//! - The binding-generation pipeline (include closure, generator
//!   invocation, build description synthesis, compile and load check)

pub mod error;
pub mod generate;
pub mod install;
pub mod paths;
pub mod process;

pub use error::{Error, Result};
pub use generate::{GenerateConfig, GenerationPipeline};
pub use install::{
    BuildConfiguration, BuildMode, CompilerFamily, EnvironmentDescriptor, InstallOptions,
    InstallationOrchestrator, SourceSpec, StagedInstaller,
};
pub use paths::InstallLayout;
pub use process::ProcessRunner;
