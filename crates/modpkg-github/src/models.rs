//! GitHub API payloads and internal configuration.
//!
//! Only the fields consumed downstream are deserialized; everything else in
//! the API responses is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// Internal client configuration derived from `GithubClientConfig`.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: std::time::Duration,
    pub per_page: u8,
    pub max_pages: u16,
}

#[cfg(test)]
impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.github.com").unwrap(),
            token: None,
            user_agent: "modpkg".to_string(),
            timeout: std::time::Duration::from_secs(30),
            per_page: 100,
            max_pages: 1,
        }
    }
}

/// `GET /repos/{owner}/{repo}/releases` item.
#[derive(Debug, Clone, Deserialize)]
pub struct GhRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub assets: Vec<GhAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhAsset {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// `GET /repos/{owner}/{repo}/pulls` item.
#[derive(Debug, Clone, Deserialize)]
pub struct GhPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub head: GhHead,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhHead {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: Option<String>,
    /// `null` once the head fork has been deleted.
    #[serde(default)]
    pub repo: Option<GhRepo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhRepo {
    #[serde(default)]
    pub fork: bool,
    pub name: String,
    pub owner: GhOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhOwner {
    pub login: String,
}

/// `GET /repos/{owner}/{repo}/commits/{ref}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GhCommit {
    pub sha: String,
}

/// Error document returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GhErrorBody {
    pub message: String,
}
