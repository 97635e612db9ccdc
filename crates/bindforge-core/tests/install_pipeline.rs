//! Installation-stage integration tests.
//!
//! External tools are replaced by stub shell scripts on an injected PATH;
//! each stub appends its invocation to a shared log so the tests can assert
//! what ran and in which order.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use bindforge_core::install::{
    BuildConfiguration, BuildMode, CompilerFamily, InstallOptions, InstallationOrchestrator,
    SourceSpec,
};
use bindforge_core::process::ProcessRunner;

/// A directory of stub executables plus the log they write to.
struct StubTools {
    bin_dir: PathBuf,
    log_file: PathBuf,
}

impl StubTools {
    fn new(temp: &TempDir) -> Self {
        let bin_dir = temp.path().join("stub-bin");
        let log_file = temp.path().join("invocations.log");
        fs::create_dir_all(&bin_dir).expect("Failed to create stub bin dir");

        // git emulates the handful of shapes the installers use: clone
        // materializes a plausible checkout, checkout materializes the
        // pybind11 include tree in the current directory.
        let git = r#"#!/bin/sh
echo "git $@" >> "$STUB_LOG"
if [ "$1" = "clone" ]; then
    for last in "$@"; do :; done
    mkdir -p "$last/source" "$last/llvm" "$last/clang-tools-extra"
    : > "$last/clang-tools-extra/CMakeLists.txt"
fi
if [ "$1" = "checkout" ]; then
    mkdir -p include/pybind11
fi
exit 0
"#;
        let passthrough = |tool: &str| {
            format!("#!/bin/sh\necho \"{} $@\" >> \"$STUB_LOG\"\nexit 0\n", tool)
        };

        // cmake materializes its `-B <dir>` build directory, the way the real
        // tool does, so the subsequent `ninja` invocation has a cwd to run in.
        let cmake = r#"#!/bin/sh
echo "cmake $@" >> "$STUB_LOG"
prev=""
for a in "$@"; do
    if [ "$prev" = "-B" ]; then mkdir -p "$a"; fi
    prev="$a"
done
exit 0
"#;

        let stubs = Self { bin_dir, log_file };
        stubs.write_stub("git", git);
        stubs.write_stub("cmake", cmake);
        stubs.write_stub("ninja", &passthrough("ninja"));
        stubs.write_stub("ldconfig", &passthrough("ldconfig"));
        stubs
    }

    fn write_stub(&self, name: &str, body: &str) {
        let path = self.bin_dir.join(name);
        fs::write(&path, body).expect("Failed to write stub");
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    fn runner(&self) -> ProcessRunner {
        // Stubs first; the tail keeps /bin utilities reachable from inside
        // the stub scripts themselves.
        ProcessRunner::new()
            .env("PATH", format!("{}:/usr/bin:/bin", self.bin_dir.display()))
            .env("STUB_LOG", self.log_file.display().to_string())
    }

    fn log(&self) -> Vec<String> {
        if !self.log_file.exists() {
            return Vec::new();
        }
        fs::read_to_string(&self.log_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn options(build_dir: &Path) -> InstallOptions {
    InstallOptions {
        build_dir: build_dir.to_path_buf(),
        binder: SourceSpec::new(Some("v1".to_string()), None).unwrap(),
        llvm: SourceSpec::new(Some("v2".to_string()), None).unwrap(),
        pybind11: SourceSpec::new(Some("abc123".to_string()), None).unwrap(),
        compiler: BuildConfiguration::new(CompilerFamily::Clang, BuildMode::Release),
        jobs: 2,
        binder_git_url: None,
        llvm_git_url: None,
        pybind11_git_url: None,
        ldconfig_dir: None,
    }
}

fn find_index(log: &[String], needle: &str) -> usize {
    log.iter()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no log line containing '{}': {:#?}", needle, log))
}

#[test]
fn install_produces_a_complete_descriptor() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);
    let build_dir = temp.path().join("build");

    let mut opts = options(&build_dir);
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();

    let descriptor = orchestrator.install().unwrap();

    assert!(build_dir.join("ENVFILE").exists());
    assert_eq!(
        descriptor.get("PYBIND11_INCLUDE_DIR"),
        Some(build_dir.join("pybind11/include").display().to_string().as_str())
    );
    assert_eq!(
        descriptor.get("LLVM_BIN_DIR"),
        Some(
            build_dir
                .join("llvm-project/build2/bin")
                .display()
                .to_string()
                .as_str()
        )
    );
    assert_eq!(descriptor.get("PYBIND11_SHA"), Some("abc123"));
    assert_eq!(descriptor.get("LLVM_VERSION"), Some("v2"));
    assert_eq!(
        descriptor.get("BINDER_SOURCE_DIR"),
        Some(build_dir.join("binder/source").display().to_string().as_str())
    );

    // The written file round-trips to the same entries.
    let loaded =
        bindforge_core::install::EnvironmentDescriptor::load(&build_dir.join("ENVFILE")).unwrap();
    assert_eq!(loaded.entries(), descriptor.entries());
}

#[test]
fn generator_and_binding_library_stage_before_the_toolchain_configures() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);

    let mut opts = options(&temp.path().join("build"));
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();
    orchestrator.install().unwrap();

    let log = stubs.log();
    let binder_clone = find_index(&log, "git clone --depth 1 --branch v1");
    let pybind11_fetch = find_index(&log, "git fetch --depth 1 origin abc123");
    let toolchain_configure = find_index(&log, "cmake llvm -B");

    assert!(binder_clone < toolchain_configure);
    assert!(pybind11_fetch < toolchain_configure);
}

#[test]
fn bootstrap_runs_two_passes_with_the_built_compiler_second() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);
    let build_dir = temp.path().join("build");

    let mut opts = options(&build_dir);
    opts.compiler = BuildConfiguration::new(CompilerFamily::Gcc, BuildMode::Release);
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();
    orchestrator.install().unwrap();

    let log = stubs.log();
    let configures: Vec<&String> = log.iter().filter(|l| l.contains("cmake llvm -B")).collect();
    assert_eq!(configures.len(), 2);

    // Pass 1 uses the system pair, pass 2 forces the bootstrapped clang in
    // a fresh build directory.
    assert!(configures[0].contains("-DCMAKE_C_COMPILER=gcc"));
    assert!(configures[0].contains(&build_dir.join("llvm-project/build").display().to_string()));
    assert!(configures[1].contains("-DCMAKE_C_COMPILER=clang"));
    assert!(configures[1].contains(&build_dir.join("llvm-project/build2").display().to_string()));

    // The runtime is registered with the dynamic linker between the passes.
    let ldconfig = find_index(&log, "ldconfig");
    let second_configure = log
        .iter()
        .rposition(|l| l.contains("cmake llvm -B"))
        .unwrap();
    assert!(ldconfig < second_configure);

    // Each pass builds, then installs the curated target subset.
    let installs: Vec<&String> = log
        .iter()
        .filter(|l| l.contains("install-clang-resource-headers"))
        .collect();
    assert_eq!(installs.len(), 2);
    assert!(installs[0].contains("tools/clang/tools/extra/binder/install"));
}

#[test]
fn prepare_is_idempotent_and_performs_no_builds() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);

    let mut opts = options(&temp.path().join("build"));
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();

    orchestrator.prepare().unwrap();
    orchestrator.prepare().unwrap();

    let log = stubs.log();
    let clones = log.iter().filter(|l| l.contains("git clone")).count();
    let fetches = log.iter().filter(|l| l.contains("git fetch")).count();
    assert_eq!(clones, 2); // binder + llvm, once each despite two prepares
    assert_eq!(fetches, 1); // pybind11, once

    assert!(!log.iter().any(|l| l.starts_with("cmake")));
    assert!(!log.iter().any(|l| l.starts_with("ninja")));
}

#[test]
fn install_after_prepare_reuses_the_staged_trees() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);

    let mut opts = options(&temp.path().join("build"));
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();

    orchestrator.prepare().unwrap();
    orchestrator.install().unwrap();

    let clones = stubs
        .log()
        .iter()
        .filter(|l| l.contains("git clone"))
        .count();
    assert_eq!(clones, 2);
}

#[test]
fn failing_external_tool_aborts_the_bootstrap() {
    let temp = TempDir::new().unwrap();
    let stubs = StubTools::new(&temp);
    stubs.write_stub(
        "ninja",
        "#!/bin/sh\necho \"ninja $@\" >> \"$STUB_LOG\"\nexit 1\n",
    );

    let mut opts = options(&temp.path().join("build"));
    opts.ldconfig_dir = Some(temp.path().join("ld.so.conf.d"));
    let orchestrator = InstallationOrchestrator::new(opts, stubs.runner()).unwrap();

    let err = orchestrator.install().unwrap_err();
    assert!(matches!(err, bindforge_core::Error::ExternalTool { .. }));

    // The first failing build stops everything: one ninja attempt, no
    // second configure, no descriptor.
    let log = stubs.log();
    assert_eq!(log.iter().filter(|l| l.starts_with("ninja")).count(), 1);
    assert_eq!(log.iter().filter(|l| l.contains("cmake llvm -B")).count(), 1);
    assert!(!temp.path().join("build/ENVFILE").exists());
}
