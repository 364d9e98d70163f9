//! Port trait implementation for `GithubClient`.
//!
//! Implements the core-owned `RemoteVersionSource` trait, converting between
//! GitHub payloads and core records.

use async_trait::async_trait;
use modpkg_core::ports::{
    HeadRepository, PullRequestHead, PullRequestRecord, ReleaseAssetRecord, ReleaseRecord,
    RemoteError, RemoteResult, RemoteVersionSource, RepositoryOwner,
};

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::http::HttpBackend;
use crate::models::{GhAsset, GhPullRequest, GhRelease};

// ============================================================================
// Error Mapping
// ============================================================================

/// Convert internal `GithubError` to core `RemoteError`.
pub(crate) fn map_error(err: GithubError) -> RemoteError {
    match err {
        GithubError::ApiRequestFailed { status, body, .. } => RemoteError::Http { status, body },
        GithubError::RateLimited { message } => RemoteError::RateLimited { message },
        GithubError::InvalidResponse { message } => RemoteError::InvalidResponse { message },
        GithubError::InvalidBaseUrl { message } => RemoteError::Configuration { message },
        GithubError::Network(e) if e.is_decode() => RemoteError::InvalidResponse {
            message: e.to_string(),
        },
        GithubError::Network(e) => RemoteError::Network {
            message: e.to_string(),
        },
        GithubError::InvalidUrl(e) => RemoteError::Configuration {
            message: e.to_string(),
        },
        GithubError::JsonParse(e) => RemoteError::InvalidResponse {
            message: e.to_string(),
        },
    }
}

// ============================================================================
// Type Conversions
// ============================================================================

fn to_asset_record(asset: GhAsset) -> ReleaseAssetRecord {
    ReleaseAssetRecord {
        name: asset.name,
        label: asset.label,
        browser_download_url: asset.browser_download_url,
        size: asset.size,
    }
}

fn to_release_record(release: GhRelease) -> ReleaseRecord {
    ReleaseRecord {
        tag_name: release.tag_name,
        name: release.name,
        created_at: release.created_at,
        prerelease: release.prerelease,
        html_url: release.html_url,
        assets: release.assets.into_iter().map(to_asset_record).collect(),
    }
}

fn to_pull_request_record(pr: GhPullRequest) -> PullRequestRecord {
    PullRequestRecord {
        number: pr.number,
        title: pr.title,
        head: PullRequestHead {
            ref_name: pr.head.ref_name,
            sha: pr.head.sha,
            repo: pr.head.repo.map(|repo| HeadRepository {
                fork: repo.fork,
                name: repo.name,
                owner: RepositoryOwner {
                    login: repo.owner.login,
                },
            }),
        },
        created_at: pr.created_at,
        html_url: pr.html_url,
    }
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl<B: HttpBackend> RemoteVersionSource for GithubClient<B> {
    async fn fetch_releases(&self, org: &str, repo: &str) -> RemoteResult<Vec<ReleaseRecord>> {
        let releases = self.list_releases(org, repo).await.map_err(map_error)?;
        Ok(releases.into_iter().map(to_release_record).collect())
    }

    async fn fetch_pull_requests(
        &self,
        org: &str,
        repo: &str,
    ) -> RemoteResult<Vec<PullRequestRecord>> {
        let pulls = self
            .list_pull_requests(org, repo)
            .await
            .map_err(map_error)?;
        Ok(pulls.into_iter().map(to_pull_request_record).collect())
    }

    async fn fetch_latest_commit(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
    ) -> RemoteResult<String> {
        let commit = self
            .latest_commit(org, repo, git_ref)
            .await
            .map_err(map_error)?;
        if commit.sha.is_empty() {
            return Err(RemoteError::InvalidResponse {
                message: format!("empty commit SHA for {org}/{repo}@{git_ref}"),
            });
        }
        Ok(commit.sha)
    }
}
