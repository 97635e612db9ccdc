//! Two-pass toolchain bootstrap.
//!
//! The final toolchain must be built with itself to get the runtime/ABI
//! combination the generated bindings link against, but no such toolchain
//! exists at the start. Pass 1 builds and installs a working (possibly
//! ABI-mismatched) clang plus the generator using the system compiler; the
//! installed runtime is registered with the dynamic linker; pass 2 then
//! rebuilds everything in a fresh build directory with the just-built clang,
//! yielding a self-consistent toolchain.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::copy_tree;
use crate::process::{ProcessRunner, argv};

use super::compiler::BuildConfiguration;
use super::source_spec::SourceSpec;
use super::staged::{EnvContribution, StagedInstaller, ensure_provenance};

/// Default upstream for the toolchain.
pub const DEFAULT_LLVM_REMOTE: &str = "https://github.com/llvm/llvm-project.git";

/// Release known to build the generator.
pub const SUGGESTED_LLVM_RELEASE: &str = "llvmorg-13.0.1";

/// Subdirectory of clang-tools-extra the generator sources are grafted into.
const GENERATOR_SUBDIR: &str = "binder";

/// Where the pass-1 install places the runtime libraries.
const RUNTIME_LIB_DIR: &str = "/usr/local/lib/x86_64-unknown-linux-gnu";

/// Drop-in file registering the runtime with the dynamic linker.
const LD_CONF_FILE: &str = "bindforge-toolchain.conf";

/// Settings for the toolchain bootstrap.
pub struct LlvmInstaller {
    spec: SourceSpec,
    config: BuildConfiguration,
    /// The generator's `source` tree; must be staged before `stage` runs.
    generator_source_dir: PathBuf,
    /// The llvm-project tree this installer owns.
    base_dir: PathBuf,
    git_remote: String,
    ldconfig_dir: PathBuf,
    jobs: usize,
    runner: ProcessRunner,
}

impl LlvmInstaller {
    pub fn new(
        spec: SourceSpec,
        config: BuildConfiguration,
        generator_source_dir: PathBuf,
        base_dir: PathBuf,
        jobs: usize,
        runner: ProcessRunner,
    ) -> Self {
        Self {
            spec,
            config,
            generator_source_dir,
            base_dir,
            git_remote: DEFAULT_LLVM_REMOTE.to_string(),
            ldconfig_dir: PathBuf::from("/etc/ld.so.conf.d"),
            jobs,
            runner,
        }
    }

    /// Override the upstream git URL.
    pub fn with_git_remote(mut self, url: impl Into<String>) -> Self {
        self.git_remote = url.into();
        self
    }

    /// Override the dynamic-linker drop-in directory.
    pub fn with_ldconfig_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ldconfig_dir = dir.into();
        self
    }

    /// Pass-1 build directory.
    fn first_build_dir(&self) -> PathBuf {
        self.base_dir.join("build")
    }

    /// Pass-2 build directory; a fresh tree, never a reconfigure in place.
    fn second_build_dir(&self) -> PathBuf {
        self.base_dir.join("build2")
    }

    /// Where the self-consistent toolchain binaries end up.
    pub fn bin_dir(&self) -> PathBuf {
        self.second_build_dir().join("bin")
    }

    fn clang_tools_extra_dir(&self) -> PathBuf {
        self.base_dir.join("clang-tools-extra")
    }

    fn generator_graft_dir(&self) -> PathBuf {
        self.clang_tools_extra_dir().join(GENERATOR_SUBDIR)
    }

    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}",
            self.spec.identity(),
            self.config.family,
            self.config.build_mode
        )
    }

    /// Graft the generator into clang-tools-extra and patch its build
    /// manifest to include it.
    fn graft_generator(&self) -> Result<()> {
        copy_tree(&self.generator_source_dir, &self.generator_graft_dir())?;

        let manifest = self.clang_tools_extra_dir().join("CMakeLists.txt");
        let mut file = OpenOptions::new().append(true).open(&manifest)?;
        writeln!(file, "\nadd_subdirectory({})", GENERATOR_SUBDIR)?;
        Ok(())
    }

    /// Configure one bootstrap pass.
    fn configure(&self, build_dir: &Path, compiler_args: &[String]) -> Result<()> {
        let mut command = vec![
            "cmake".to_string(),
            "llvm".to_string(),
            "-B".to_string(),
            build_dir.display().to_string(),
            "-G".to_string(),
            "Ninja".to_string(),
        ];
        command.extend_from_slice(compiler_args);
        command.extend(
            [
                "-DLLVM_ENABLE_LIBCXX=ON",
                "-DLLVM_INCLUDE_TESTS=OFF",
                "-DLLVM_ENABLE_RUNTIMES=libc;libcxx;libcxxabi",
                "-DLLVM_ENABLE_PROJECTS=clang-tools-extra;clang",
                "-DLLVM_ENABLE_EH=1",
                "-DLLVM_ENABLE_RTTI=ON",
            ]
            .map(str::to_string),
        );
        self.runner.run(&command, Some(&self.base_dir))
    }

    /// Build all requested targets, then install the curated subset:
    /// resource headers, runtime, runtime-ABI layer, the compiler, the
    /// generator's install target and the compiler headers.
    fn build_and_install(&self, build_dir: &Path) -> Result<()> {
        let cwd = Some(build_dir);
        self.runner
            .run(&argv(&format!("ninja -j {}", self.jobs)), cwd)?;
        self.runner.run(
            &argv(&format!(
                "ninja install-clang-resource-headers install-cxx install-cxxabi \
                 install-clang tools/clang/tools/extra/{}/install install-clang-headers -j {}",
                GENERATOR_SUBDIR, self.jobs
            )),
            cwd,
        )
    }

    /// Register the installed runtime library path with the dynamic
    /// linker's system-wide search configuration, so every later process
    /// invocation resolves it.
    fn register_runtime_libs(&self) -> Result<()> {
        fs::create_dir_all(&self.ldconfig_dir)?;
        fs::write(self.ldconfig_dir.join(LD_CONF_FILE), RUNTIME_LIB_DIR)?;
        self.runner.run(&argv("ldconfig"), None)
    }
}

impl StagedInstaller for LlvmInstaller {
    fn name(&self) -> &'static str {
        "llvm"
    }

    fn stage(&self) -> Result<()> {
        if !self.generator_source_dir.is_dir() {
            return Err(Error::MissingArtifact(format!(
                "cannot bootstrap the toolchain without the generator sources, nothing at {}",
                self.generator_source_dir.display()
            )));
        }

        if self.base_dir.is_dir() {
            tracing::debug!("toolchain already staged at {}", self.base_dir.display());
            return ensure_provenance(&self.base_dir, &self.fingerprint());
        }

        match &self.spec {
            SourceSpec::Local(source) => copy_tree(source, &self.base_dir)?,
            SourceSpec::Pinned(release) => self.runner.run(
                &argv(&format!(
                    "git clone --depth 1 --branch {} {} {}",
                    release,
                    self.git_remote,
                    self.base_dir.display()
                )),
                None,
            )?,
        }

        self.graft_generator()?;
        ensure_provenance(&self.base_dir, &self.fingerprint())
    }

    fn build(&self) -> Result<Vec<EnvContribution>> {
        // Pass 1: the system compiler produces a working toolchain.
        let first = self.first_build_dir();
        self.configure(&first, &self.config.cmake_args())?;
        self.build_and_install(&first)?;
        self.register_runtime_libs()?;

        // Pass 2: a fresh build directory, forcing the just-installed
        // clang pair so the result is self-consistent.
        let second = self.second_build_dir();
        self.configure(
            &second,
            &BuildConfiguration::cmake_args_for("clang", "clang++", self.config.build_mode),
        )?;
        self.build_and_install(&second)?;

        Ok(vec![
            (
                "LLVM_BIN_DIR".to_string(),
                self.bin_dir().display().to_string(),
            ),
            ("LLVM_VERSION".to_string(), self.spec.identity()),
        ])
    }
}
