//! Records returned by a remote version source.
//!
//! Field names follow the GitHub REST payloads so that cached listings look
//! like the API responses they were fetched from. Only the fields consumed by
//! the resolver are modelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published release (or prerelease) of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Git tag the release points at.
    pub tag_name: String,
    /// Human-readable release title. Often empty, in which case the tag is
    /// used for display.
    #[serde(default)]
    pub name: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the release is flagged as a prerelease.
    #[serde(default)]
    pub prerelease: bool,
    /// Release page (changelog).
    #[serde(default)]
    pub html_url: String,
    /// Files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAssetRecord>,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAssetRecord {
    pub name: String,
    /// Free-form label; `project` and `plugin` are recognised.
    #[serde(default)]
    pub label: Option<String>,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub head: PullRequestHead,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
}

/// The head (source) side of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestHead {
    /// Branch name on the head repository.
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commit the branch currently points at.
    #[serde(default)]
    pub sha: Option<String>,
    /// Head repository; absent when the fork has been deleted.
    #[serde(default)]
    pub repo: Option<HeadRepository>,
}

/// Repository on the head side of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRepository {
    #[serde(default)]
    pub fork: bool,
    pub name: String,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_release_deserializes_from_api_shape() {
        let value = json!({
            "tag_name": "v1.2.0",
            "name": "",
            "created_at": "2024-03-01T10:00:00Z",
            "prerelease": false,
            "html_url": "https://github.com/org/repo/releases/tag/v1.2.0",
            "draft": false,
            "assets": [{
                "name": "project.zip",
                "label": "project",
                "browser_download_url": "https://example.com/project.zip",
                "size": 2048,
                "content_type": "application/zip"
            }]
        });

        let release: ReleaseRecord = serde_json::from_value(value).unwrap();
        assert_eq!(release.tag_name, "v1.2.0");
        assert_eq!(release.name.as_deref(), Some(""));
        assert!(release.created_at.is_some());
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].label.as_deref(), Some("project"));
    }

    #[test]
    fn test_pull_request_head_ref_rename() {
        let value = json!({
            "number": 42,
            "title": "Fix things",
            "head": {
                "ref": "fix-things",
                "sha": "0123456789abcdef",
                "repo": {"fork": true, "name": "fork-repo", "owner": {"login": "alice"}}
            },
            "created_at": "2024-03-01T10:00:00Z",
            "html_url": "https://github.com/org/repo/pull/42"
        });

        let pr: PullRequestRecord = serde_json::from_value(value).unwrap();
        assert_eq!(pr.head.ref_name, "fix-things");
        assert_eq!(pr.head.repo.as_ref().unwrap().owner.login, "alice");

        let round = serde_json::to_value(&pr).unwrap();
        assert_eq!(round["head"]["ref"], "fix-things");
    }

    #[test]
    fn test_pull_request_with_deleted_fork() {
        let value = json!({
            "number": 7,
            "title": "Orphan",
            "head": {"ref": "orphan", "sha": null, "repo": null}
        });

        let pr: PullRequestRecord = serde_json::from_value(value).unwrap();
        assert!(pr.head.repo.is_none());
        assert!(pr.head.sha.is_none());
    }
}
