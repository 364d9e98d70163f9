//! Time-expiring JSON cache of remote listings.
//!
//! Entries are keyed by (organisation, repository, kind) and stored as
//! `<root>/github_api/{org}/{repo}/{kind}.json`. Freshness is the file's
//! modification time: anything older than the TTL counts as absent.
//!
//! The `try_*` operations report failures; `read` and `write` are the
//! degraded path used by the resolver, which logs the failure and carries on
//! without the cache.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Age after which a cached listing is ignored.
pub const METADATA_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Which listing an entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Releases,
    Pulls,
}

impl CacheKind {
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Releases => "releases.json",
            Self::Pulls => "pulls.json",
        }
    }
}

/// Metadata cache failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache entry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Metadata cache rooted at a cache directory.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    root: PathBuf,
    ttl: Duration,
}

impl MetadataCache {
    /// Cache below `cache_root` with the default one hour TTL.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            root: cache_root.into().join("github_api"),
            ttl: METADATA_CACHE_TTL,
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of an entry.
    pub fn entry_path(&self, org: &str, repo: &str, kind: CacheKind) -> PathBuf {
        self.root.join(org).join(repo).join(kind.file_name())
    }

    /// Read a fresh entry.
    ///
    /// `Ok(None)` when the entry is missing or expired.
    pub async fn try_read<T: DeserializeOwned>(
        &self,
        org: &str,
        repo: &str,
        kind: CacheKind,
    ) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(org, repo, kind);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }),
        };
        let modified = metadata
            .modified()
            .map_err(|source| CacheError::Read {
                path: path.clone(),
                source,
            })?;
        if self.is_expired(modified) {
            tracing::debug!(target: "modpkg.cache", path = %path.display(), "Cache entry expired");
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| CacheError::Read {
                path: path.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Parse { path, source })
    }

    /// Write an entry, creating parent directories.
    pub async fn try_write<T: Serialize + Sync>(
        &self,
        org: &str,
        repo: &str,
        kind: CacheKind,
        payload: &T,
    ) -> Result<(), CacheError> {
        let path = self.entry_path(org, repo, kind);
        let bytes = serde_json::to_vec_pretty(payload).map_err(|source| CacheError::Parse {
            path: path.clone(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| CacheError::Write { path, source })
    }

    /// Read a fresh entry, treating every failure as a miss.
    pub async fn read<T: DeserializeOwned>(
        &self,
        org: &str,
        repo: &str,
        kind: CacheKind,
    ) -> Option<T> {
        match self.try_read(org, repo, kind).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(target: "modpkg.cache", error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Write an entry; failures are logged and swallowed.
    pub async fn write<T: Serialize + Sync>(
        &self,
        org: &str,
        repo: &str,
        kind: CacheKind,
        payload: &T,
    ) {
        if let Err(e) = self.try_write(org, repo, kind, payload).await {
            tracing::warn!(target: "modpkg.cache", error = %e, "Failed to update cache entry");
        }
    }

    fn is_expired(&self, modified: SystemTime) -> bool {
        // A modification time in the future counts as fresh.
        SystemTime::now()
            .duration_since(modified)
            .is_ok_and(|age| age > self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::fs::File;

    fn backdate(path: &Path, by: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_within_ttl() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path());
        let payload = json!([{"tag_name": "v1.0.0", "prerelease": false}]);

        cache
            .try_write("org", "repo", CacheKind::Releases, &payload)
            .await
            .unwrap();
        let back: Option<Value> = cache.read("org", "repo", CacheKind::Releases).await;

        assert_eq!(back, Some(payload));
        assert!(temp
            .path()
            .join("github_api/org/repo/releases.json")
            .is_file());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path());
        cache
            .write("org", "repo", CacheKind::Pulls, &json!([]))
            .await;

        backdate(
            &cache.entry_path("org", "repo", CacheKind::Pulls),
            Duration::from_secs(3601),
        );

        let back: Option<Value> = cache.read("org", "repo", CacheKind::Pulls).await;
        assert!(back.is_none());
    }

    #[tokio::test]
    async fn test_entry_just_inside_ttl_is_fresh() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path());
        cache
            .write("org", "repo", CacheKind::Pulls, &json!([1]))
            .await;

        backdate(
            &cache.entry_path("org", "repo", CacheKind::Pulls),
            Duration::from_secs(3500),
        );

        let back: Option<Value> = cache.read("org", "repo", CacheKind::Pulls).await;
        assert_eq!(back, Some(json!([1])));
    }

    #[tokio::test]
    async fn test_missing_entry_is_soft_miss() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path());
        let back: Result<Option<Value>, _> =
            cache.try_read("org", "repo", CacheKind::Releases).await;
        assert!(matches!(back, Ok(None)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_reports_parse_error_and_reads_as_miss() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path());
        let path = cache.entry_path("org", "repo", CacheKind::Releases);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let strict: Result<Option<Value>, _> =
            cache.try_read("org", "repo", CacheKind::Releases).await;
        assert!(matches!(strict, Err(CacheError::Parse { .. })));

        let soft: Option<Value> = cache.read("org", "repo", CacheKind::Releases).await;
        assert!(soft.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let temp = tempfile::tempdir().unwrap();
        // A file where the cache root directory should be.
        let blocker = temp.path().join("github_api");
        std::fs::write(&blocker, b"").unwrap();
        let cache = MetadataCache::new(temp.path());

        cache
            .write("org", "repo", CacheKind::Releases, &json!([]))
            .await;
        assert!(cache
            .try_write("org", "repo", CacheKind::Releases, &json!([]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let temp = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(temp.path()).with_ttl(Duration::from_secs(10));
        cache
            .write("org", "repo", CacheKind::Releases, &json!([]))
            .await;
        backdate(
            &cache.entry_path("org", "repo", CacheKind::Releases),
            Duration::from_secs(11),
        );
        let back: Option<Value> = cache.read("org", "repo", CacheKind::Releases).await;
        assert!(back.is_none());
    }
}
