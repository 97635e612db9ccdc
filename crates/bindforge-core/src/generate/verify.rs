//! Compile the synthesized project and verify the artifact loads.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::ProcessRunner;

/// Platform-specific extension of a loadable module.
pub fn module_extension() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "dll"
    }
    #[cfg(target_os = "macos")]
    {
        "so" // extension modules use .so on macOS too
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        "so"
    }
}

/// Drive the external build tool's configure and build steps.
///
/// Runs from inside `build_dir` against the description written one level
/// up. A non-zero exit from either step aborts the pipeline.
pub fn compile(
    runner: &ProcessRunner,
    build_dir: &Path,
    cc: &str,
    cxx: &str,
    jobs: usize,
) -> Result<()> {
    let configure = vec![
        "cmake".to_string(),
        "-G".to_string(),
        "Ninja".to_string(),
        format!("-DCMAKE_CXX_COMPILER={}", cxx),
        format!("-DCMAKE_C_COMPILER={}", cc),
        "..".to_string(),
    ];
    runner.run(&configure, Some(build_dir))?;

    let build = vec!["ninja".to_string(), "-j".to_string(), jobs.to_string()];
    runner.run(&build, Some(build_dir))
}

/// Locate the built extension module for `module_name` under `build_dir`.
///
/// pybind11 suffixes the platform tag onto the file stem, so the match is
/// on name prefix plus loadable-module extension.
pub fn find_module_artifact(build_dir: &Path, module_name: &str) -> Result<PathBuf> {
    let prefix = format!("{}.", module_name);
    let mut candidates = Vec::new();
    for entry in fs::read_dir(build_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && name.ends_with(module_extension()) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    candidates.into_iter().next().ok_or_else(|| {
        Error::MissingArtifact(format!(
            "no loadable module named '{}' under {}",
            module_name,
            build_dir.display()
        ))
    })
}

/// Load the built module as a smoke test.
///
/// A load failure is the pipeline's final observable result, never
/// swallowed. Returns the artifact path on success.
pub fn verify_loads(build_dir: &Path, module_name: &str) -> Result<PathBuf> {
    let artifact = find_module_artifact(build_dir, module_name)?;
    tracing::info!("smoke-testing module load: {}", artifact.display());

    // SAFETY: the artifact's initializers are the module's own; loading it
    // is exactly what the eventual consumer does.
    let library = unsafe { libloading::Library::new(&artifact)? };
    drop(library);

    tracing::info!("module '{}' loads", module_name);
    Ok(artifact)
}
