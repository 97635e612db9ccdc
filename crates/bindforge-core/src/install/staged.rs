//! Installer lifecycle: staged preparation and installation.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// One key/value pair contributed to the environment descriptor.
pub type EnvContribution = (String, String);

/// Name of the fingerprint file stamped into each materialized directory.
const PROVENANCE_FILE: &str = ".provenance";

/// A component that materializes inputs and integrates them into the build
/// tree.
///
/// `stage` is the idempotent half: it downloads or copies sources, skipping
/// all network and copy work when its target directory already exists, so
/// repeated invocations are safe and runs are resumable after an upstream
/// failure. `build` performs the build/integrate step and returns the
/// installer's contributions to the environment descriptor.
///
/// The public entry points guarantee that installing always implies
/// preparation, and let a caller run preparation alone as a pre-fetch step.
pub trait StagedInstaller {
    /// Short name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Materialize inputs without building. Must be idempotent.
    fn stage(&self) -> Result<()>;

    /// Build/integrate staged inputs and report descriptor contributions.
    fn build(&self) -> Result<Vec<EnvContribution>>;

    /// Stage only.
    fn prepare(&self) -> Result<()> {
        self.stage()
    }

    /// Stage, then build.
    fn install(&self) -> Result<Vec<EnvContribution>> {
        self.stage()?;
        self.build()
    }
}

/// Stamp or verify the provenance fingerprint of a materialized directory.
///
/// A directory left behind by an earlier run is only reusable when it was
/// produced from the same sources and configuration; a mismatch aborts the
/// run rather than silently mixing state. A directory without a fingerprint
/// (pre-seeded by the caller) is accepted and stamped.
pub fn ensure_provenance(dir: &Path, fingerprint: &str) -> Result<()> {
    let marker = dir.join(PROVENANCE_FILE);
    if marker.exists() {
        let recorded = fs::read_to_string(&marker)?;
        let recorded = recorded.trim();
        if recorded != fingerprint {
            return Err(Error::Validation(format!(
                "directory '{}' was materialized from '{}' but this run wants '{}'; use a fresh build directory",
                dir.display(),
                recorded,
                fingerprint
            )));
        }
        return Ok(());
    }
    fs::write(&marker, fingerprint)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_directory_is_stamped() {
        let temp = TempDir::new().unwrap();
        ensure_provenance(temp.path(), "v1|clang|Release").unwrap();

        let recorded = fs::read_to_string(temp.path().join(PROVENANCE_FILE)).unwrap();
        assert_eq!(recorded, "v1|clang|Release");
    }

    #[test]
    fn matching_fingerprint_is_accepted() {
        let temp = TempDir::new().unwrap();
        ensure_provenance(temp.path(), "v1").unwrap();
        ensure_provenance(temp.path(), "v1").unwrap();
    }

    #[test]
    fn mismatched_fingerprint_is_rejected() {
        let temp = TempDir::new().unwrap();
        ensure_provenance(temp.path(), "v1|clang|Release").unwrap();

        let err = ensure_provenance(temp.path(), "v2|clang|Release").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("fresh build directory"));
    }
}
