//! Error types for bindforge-core.

use thiserror::Error;

/// Result type for bindforge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bindforge-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or contradictory configuration.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// An external process exited with a non-zero status.
    #[error("external command failed{}: {command}", code.map(|c| format!(" (exit code {})", c)).unwrap_or_else(|| " (terminated by signal)".to_string()))]
    ExternalTool {
        command: String,
        code: Option<i32>,
    },

    /// An expected output file or directory is absent after the step that
    /// should have produced it.
    #[error("missing expected artifact: {0}")]
    MissingArtifact(String),

    /// The generated-source manifest contains a duplicate entry. The module
    /// shares a name with one of its namespaces or classes, which makes the
    /// generator overwrite its own output.
    #[error("duplicated generated source '{0}': do not name your module the same as one of your namespaces/classes")]
    NameCollision(String),

    /// Failed to load the built extension module.
    #[error("failed to load module: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
