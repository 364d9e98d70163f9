//! Cache location resolution.
//!
//! Both the metadata cache and the artifact cache live below one cache root:
//!
//! ```text
//! <cache_root>/
//!   github_api/{org}/{repo}/{releases|pulls}.json
//!   pkgs/{org}/{repo}/{package}/...
//! ```

mod error;

use std::path::{Path, PathBuf};

pub use error::PathError;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "MODPKG_CACHE_DIR";

/// Resolve the cache root.
///
/// Uses `MODPKG_CACHE_DIR` when set and non-empty, otherwise the platform
/// cache directory joined with `modpkg`.
pub fn cache_root() -> Result<PathBuf, PathError> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    dirs::cache_dir()
        .map(|dir| dir.join("modpkg"))
        .ok_or(PathError::NoCacheDir)
}

/// Create `path` (and parents) if missing.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
