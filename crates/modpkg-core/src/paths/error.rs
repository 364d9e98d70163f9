//! Path resolution errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the platform cache directory.
    #[error("Could not determine the system cache directory")]
    NoCacheDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Path exists but is not a directory.
    #[error("Path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),
}
