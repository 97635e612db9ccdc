//! Build-directory layout for an installation run.
//!
//! Keeps the same paths in use across the orchestrator, the installers and
//! the CLI:
//!
//! ```text
//! <build>/
//! ├── binder/        # binding-generator sources (when cloned)
//! ├── llvm-project/  # toolchain tree, patched with the generator subdir
//! │   ├── build/     # bootstrap pass 1
//! │   └── build2/    # bootstrap pass 2
//! ├── pybind11/      # header-only binding library
//! └── ENVFILE        # environment descriptor
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory structure of one installation build tree.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    /// The base build directory itself.
    pub build_dir: PathBuf,

    /// Where binder sources are cloned when a branch is pinned.
    pub binder_dir: PathBuf,

    /// The toolchain source tree.
    pub llvm_dir: PathBuf,

    /// The generic binding library tree.
    pub pybind11_dir: PathBuf,

    /// The environment descriptor written at the end of a run.
    pub envfile: PathBuf,
}

impl InstallLayout {
    /// Create the layout under `build_dir`, creating the base directory.
    ///
    /// Subdirectories are owned and created by their installers; only the
    /// base directory is materialized here.
    pub fn new(build_dir: impl Into<PathBuf>) -> Result<Self> {
        let build_dir = build_dir.into();
        fs::create_dir_all(&build_dir)?;

        Ok(Self {
            binder_dir: build_dir.join("binder"),
            llvm_dir: build_dir.join("llvm-project"),
            pybind11_dir: build_dir.join("pybind11"),
            envfile: build_dir.join("ENVFILE"),
            build_dir,
        })
    }
}

/// Recursively copy a directory tree.
///
/// Follows the source in depth-first order; symlinks are copied as the files
/// they point at.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_creates_base_dir_only() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let base = temp.path().join("build");

        let layout = InstallLayout::new(&base).expect("Failed to create layout");

        assert!(layout.build_dir.exists());
        assert!(!layout.binder_dir.exists());
        assert!(!layout.llvm_dir.exists());
        assert_eq!(layout.envfile, base.join("ENVFILE"));
    }

    #[test]
    fn copy_tree_copies_nested_files() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();

        let dst = temp.path().join("dst");
        copy_tree(&src, &dst).expect("Failed to copy tree");

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
    }
}
