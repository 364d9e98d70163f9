//! Artifact cache layout.
//!
//! ```text
//! <cache_root>/pkgs/{org}/{repo}/{sanitized_name}/
//!     source.zip            src/        releases (tags are immutable)
//!     source-1a2b3c4d.zip   src-1a2b3c4d/   branches and pull requests
//!     source-unresolved-<nonce>.zip         commit unknown, single use
//!     project[...].zip      project[...]/
//!     plugin[...].zip       plugin[...]/
//! ```

use std::path::{Path, PathBuf};

use modpkg_core::{AcquireError, ArtifactSlot, Package, PackageKind};

/// Longest sanitized package directory name.
const MAX_NAME_LEN: usize = 40;

/// Marker for artifacts that must never be reused.
const UNRESOLVED_MARKER: &str = "-unresolved-";

/// Turn a package name into a short, filesystem-safe directory name.
///
/// Releases are named after their tag, the ref their archive is downloaded
/// from; display names are not unique. Pull requests collapse to
/// `PR_<number>`: titles are arbitrary text and can exceed path limits on
/// some platforms.
pub fn sanitize_package_name(package: &Package) -> String {
    match package.kind() {
        PackageKind::Release => sanitize_name(package.branch_name()),
        PackageKind::PullRequest => package
            .pull_number()
            .map_or_else(|| sanitize_name(package.name()), |number| format!("PR_{number}")),
        PackageKind::Branch | PackageKind::FromArchive => sanitize_name(package.name()),
    }
}

fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        let hostile = matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '#')
            || c.is_whitespace()
            || c.is_control();
        if hostile {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }

    let trimmed: String = out
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches(['_', '.']);

    if trimmed.is_empty() {
        "package".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Identity an artifact is cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKey {
    /// Release content, fixed by its tag.
    Immutable,
    /// Branch or pull request content at a known commit (8-char prefix).
    Commit(String),
    /// Content of unknown identity; the nonce makes the names single-use.
    Unresolved(String),
}

impl ArtifactKey {
    /// Key for the current state of `package`.
    pub fn for_package(package: &Package) -> Self {
        match package.kind() {
            PackageKind::Release => Self::Immutable,
            PackageKind::Branch | PackageKind::PullRequest => package.commit_sha().map_or_else(
                Self::unresolved,
                |sha| Self::Commit(sha.get(..8).unwrap_or(sha).to_string()),
            ),
            PackageKind::FromArchive => Self::unresolved(),
        }
    }

    fn unresolved() -> Self {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        Self::Unresolved(nonce.chars().take(12).collect())
    }

    /// Whether a cached artifact under this key may be served again.
    pub const fn is_reusable(&self) -> bool {
        !matches!(self, Self::Unresolved(_))
    }

    fn suffix(&self) -> String {
        match self {
            Self::Immutable => String::new(),
            Self::Commit(prefix) => format!("-{prefix}"),
            Self::Unresolved(nonce) => format!("{UNRESOLVED_MARKER}{nonce}"),
        }
    }
}

/// Planned on-disk location of one package's artifacts.
#[derive(Debug, Clone)]
pub struct PackageDestination {
    dir: PathBuf,
    key: ArtifactKey,
}

impl PackageDestination {
    /// Plan the destination of `package` below `cache_root`.
    pub fn plan(cache_root: &Path, package: &Package) -> Self {
        let dir = cache_root
            .join("pkgs")
            .join(package.organisation())
            .join(package.repository())
            .join(sanitize_package_name(package));
        Self {
            dir,
            key: ArtifactKey::for_package(package),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn key(&self) -> &ArtifactKey {
        &self.key
    }

    /// Cached archive path of `slot`.
    pub fn archive_path(&self, slot: ArtifactSlot) -> PathBuf {
        self.dir
            .join(format!("{}{}.zip", slot.archive_stem(), self.key.suffix()))
    }

    /// Extraction directory of `slot`.
    pub fn extract_dir(&self, slot: ArtifactSlot) -> PathBuf {
        self.dir
            .join(format!("{}{}", slot.extract_dir_name(), self.key.suffix()))
    }

    /// Create the package directory.
    pub fn ensure_dir(&self) -> Result<(), AcquireError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| AcquireError::from_io_error(&e))
    }

    /// Remove single-use artifacts left behind by earlier runs.
    ///
    /// Best-effort: failures are logged.
    pub fn remove_stale_unresolved(&self) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().contains(UNRESOLVED_MARKER) {
                continue;
            }
            let path = entry.path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    tracing::debug!(target: "modpkg.acquire", path = %path.display(), "Removed stale artifact");
                }
                Err(e) => {
                    tracing::warn!(target: "modpkg.acquire", path = %path.display(), error = %e, "Failed to remove stale artifact");
                }
            }
        }
    }
}
