//! Staged installation of the binding toolchain.
//!
//! Three installers behind one lifecycle trait:
//! - generator sources (staged for the toolchain build to incorporate)
//! - the generic binding library (header-only, no build step)
//! - the toolchain itself (two-pass self-hosting bootstrap)
//!
//! The orchestrator runs them in dependency order and assembles the
//! environment descriptor consumed by the generation pipeline.

mod compiler;
mod generator;
mod llvm;
mod orchestrator;
mod pybind11;
mod source_spec;
mod staged;

pub use compiler::{BuildConfiguration, BuildMode, CompilerFamily};
pub use generator::{DEFAULT_BINDER_REMOTE, GeneratorInstaller};
pub use llvm::{DEFAULT_LLVM_REMOTE, LlvmInstaller, SUGGESTED_LLVM_RELEASE};
pub use orchestrator::{EnvironmentDescriptor, InstallOptions, InstallationOrchestrator};
pub use pybind11::{DEFAULT_PYBIND11_REMOTE, Pybind11Installer, SUPPORTED_PYBIND11_SHA};
pub use source_spec::SourceSpec;
pub use staged::{EnvContribution, StagedInstaller, ensure_provenance};
