//! Resolution of version-vs-local-source dependency specifications.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A resolved choice between a pinned version identifier and a local source
/// tree.
///
/// Exactly one of the two is ever set; constructing anything else is a
/// validation error. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A pinned upstream identifier: a release tag, branch or commit sha.
    Pinned(String),
    /// A source tree already present on disk.
    Local(PathBuf),
}

impl SourceSpec {
    /// Resolve a pair of optional inputs into a spec.
    ///
    /// Empty strings count as unset. Fails unless exactly one of
    /// `version` / `local` is supplied.
    pub fn new(version: Option<String>, local: Option<PathBuf>) -> Result<Self> {
        let version = version.filter(|v| !v.is_empty());
        let local = local.filter(|p| !p.as_os_str().is_empty());

        match (version, local) {
            (Some(v), None) => Ok(Self::Pinned(v)),
            (None, Some(p)) => Ok(Self::Local(p)),
            (Some(v), Some(p)) => Err(Error::Validation(format!(
                "must have only a version OR a source location, not both -- have version='{}', source='{}'",
                v,
                p.display()
            ))),
            (None, None) => Err(Error::Validation(
                "must have a version OR a source location, have neither".to_string(),
            )),
        }
    }

    /// The pinned identifier, if this spec is pinned.
    pub fn pinned(&self) -> Option<&str> {
        match self {
            Self::Pinned(v) => Some(v),
            Self::Local(_) => None,
        }
    }

    /// The local source tree, if this spec points at one.
    pub fn local(&self) -> Option<&Path> {
        match self {
            Self::Pinned(_) => None,
            Self::Local(p) => Some(p),
        }
    }

    /// Provenance/cache key: the pinned identifier verbatim, or a key
    /// derived from the local path. Never used for filesystem
    /// materialization directly.
    pub fn identity(&self) -> String {
        match self {
            Self::Pinned(v) => v.clone(),
            Self::Local(p) => format!("FROM_SOURCE_{}", p.display()),
        }
    }
}
