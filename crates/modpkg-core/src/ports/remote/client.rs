//! Remote version source port definition.

use async_trait::async_trait;

use super::error::RemoteResult;
use super::types::{PullRequestRecord, ReleaseRecord};

/// Port for listing the published versions of a repository.
///
/// Each call issues one authenticated request (or a bounded number of page
/// requests) and performs no retries; retry policy belongs to the caller.
/// Implementations surface quota exhaustion as
/// [`RemoteError::RateLimited`](super::RemoteError::RateLimited).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteVersionSource: Send + Sync {
    /// List the releases of `org/repo`, in the order the host returns them.
    async fn fetch_releases(&self, org: &str, repo: &str) -> RemoteResult<Vec<ReleaseRecord>>;

    /// List the open pull requests of `org/repo`.
    async fn fetch_pull_requests(
        &self,
        org: &str,
        repo: &str,
    ) -> RemoteResult<Vec<PullRequestRecord>>;

    /// Resolve `git_ref` to the SHA of the commit it currently points at.
    async fn fetch_latest_commit(&self, org: &str, repo: &str, git_ref: &str)
    -> RemoteResult<String>;
}
