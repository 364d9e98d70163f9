//! Release, pull request and commit listing.

use serde::de::DeserializeOwned;
use url::Url;

use super::GithubClient;
use crate::error::GithubResult;
use crate::http::HttpBackend;
use crate::models::{GhCommit, GhPullRequest, GhRelease};
use crate::url::{build_commit_url, build_pulls_url, build_releases_url};

impl<B: HttpBackend> GithubClient<B> {
    /// List releases, newest first as returned by the API.
    pub(crate) async fn list_releases(&self, org: &str, repo: &str) -> GithubResult<Vec<GhRelease>> {
        let url = build_releases_url(&self.config, org, repo)?;
        let releases: Vec<GhRelease> = self.collect_pages(url).await?;
        // Drafts are only visible to maintainers and have no downloadable tag.
        Ok(releases.into_iter().filter(|r| !r.draft).collect())
    }

    /// List open pull requests.
    pub(crate) async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
    ) -> GithubResult<Vec<GhPullRequest>> {
        let url = build_pulls_url(&self.config, org, repo)?;
        self.collect_pages(url).await
    }

    /// Resolve a ref to its head commit.
    pub(crate) async fn latest_commit(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
    ) -> GithubResult<GhCommit> {
        let url = build_commit_url(&self.config, org, repo, git_ref)?;
        self.backend.get_json(&url).await
    }

    /// Follow `rel="next"` links up to the configured page cap.
    async fn collect_pages<T: DeserializeOwned + Send>(&self, first: Url) -> GithubResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0u16;

        while let Some(url) = next.take() {
            let (page, following): (Vec<T>, Option<Url>) =
                self.backend.get_json_paginated(&url).await?;
            items.extend(page);
            pages += 1;

            if pages >= self.config.max_pages {
                if following.is_some() {
                    tracing::debug!(
                        target: "modpkg.github",
                        pages,
                        "Page cap reached, listing truncated"
                    );
                }
                break;
            }
            next = following;
        }

        Ok(items)
    }
}
