//! Installable versions of a module.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{PullRequestRecord, ReleaseAssetRecord, ReleaseRecord};

/// Host serving repository snapshot archives.
const ARCHIVE_HOST: &str = "https://github.com";

/// Where a package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    /// A tagged release or prerelease.
    Release,
    /// The head of a branch.
    Branch,
    /// The head of a pull request.
    PullRequest,
    /// A zip archive supplied by the user.
    FromArchive,
}

impl PackageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Branch => "branch",
            Self::PullRequest => "pull_request",
            Self::FromArchive => "from_archive",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(Self::Release),
            "branch" => Ok(Self::Branch),
            "pull_request" => Ok(Self::PullRequest),
            "from_archive" => Ok(Self::FromArchive),
            other => Err(format!("unknown package kind: {other}")),
        }
    }
}

/// Role of a release asset, taken from its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Project,
    Plugin,
}

impl AssetKind {
    /// Classify an asset label. Unknown labels are not installable assets.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "project" => Some(Self::Project),
            "plugin" => Some(Self::Plugin),
            _ => None,
        }
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub label: String,
    pub kind: AssetKind,
    pub download_url: String,
    /// Size declared by the host.
    pub size: u64,
}

impl Asset {
    fn from_record(record: &ReleaseAssetRecord) -> Option<Self> {
        let label = record.label.as_deref()?;
        let kind = AssetKind::from_label(label)?;
        Some(Self {
            name: record.name.clone(),
            label: label.to_string(),
            kind,
            download_url: record.browser_download_url.clone(),
            size: record.size,
        })
    }
}

/// One installable version of a module.
///
/// The download URL is derived from (organisation, repository, kind, branch)
/// when the package is built and cannot change afterwards. The commit SHA is
/// the only late-bound field: it is shared by every clone of the package, so a
/// SHA resolved in the background becomes visible to all holders.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    kind: PackageKind,
    name: String,
    branch: String,
    organisation: String,
    repository: String,
    created_at: Option<DateTime<Utc>>,
    prerelease: bool,
    html_url: String,
    pull_number: Option<u64>,
    commit_sha: Arc<OnceLock<String>>,
    download_url: Option<String>,
    asset_project: Option<Asset>,
    asset_plugin: Option<Asset>,
}

impl Package {
    fn base(kind: PackageKind, organisation: &str, repository: &str, branch: &str) -> Self {
        Self {
            kind,
            name: branch.to_string(),
            branch: branch.to_string(),
            organisation: organisation.to_string(),
            repository: repository.to_string(),
            created_at: None,
            prerelease: false,
            html_url: String::new(),
            pull_number: None,
            commit_sha: Arc::new(OnceLock::new()),
            download_url: None,
            asset_project: None,
            asset_plugin: None,
        }
    }

    fn with_derived_url(mut self) -> Self {
        self.download_url = Some(archive_url(
            &self.organisation,
            &self.repository,
            self.kind,
            &self.branch,
        ));
        self
    }

    /// Build a release package from a release record.
    pub fn from_release(organisation: &str, repository: &str, record: &ReleaseRecord) -> Self {
        let mut package = Self::base(
            PackageKind::Release,
            organisation,
            repository,
            &record.tag_name,
        );
        if let Some(name) = record.name.as_deref().filter(|n| !n.is_empty()) {
            package.name = name.to_string();
        }
        package.created_at = record.created_at;
        package.prerelease = record.prerelease;
        package.html_url.clone_from(&record.html_url);

        for asset in record.assets.iter().filter_map(Asset::from_record) {
            match asset.kind {
                AssetKind::Project => package.asset_project = Some(asset),
                AssetKind::Plugin => package.asset_plugin = Some(asset),
            }
        }

        package.with_derived_url()
    }

    /// Build a pull request package.
    ///
    /// For pull requests opened from a fork the package points at the fork,
    /// since the head branch does not exist upstream.
    pub fn from_pull_request(
        organisation: &str,
        repository: &str,
        record: &PullRequestRecord,
    ) -> Self {
        let (organisation, repository) = match record.head.repo.as_ref() {
            Some(head_repo) if head_repo.fork => {
                (head_repo.owner.login.as_str(), head_repo.name.as_str())
            }
            _ => (organisation, repository),
        };

        let mut package = Self::base(
            PackageKind::PullRequest,
            organisation,
            repository,
            &record.head.ref_name,
        );
        package.name = format!("#{} {}", record.number, record.title);
        package.created_at = record.created_at;
        package.html_url.clone_from(&record.html_url);
        package.pull_number = Some(record.number);
        if let Some(sha) = record.head.sha.as_deref().filter(|s| !s.is_empty()) {
            let _ = package.commit_sha.set(sha.to_string());
        }

        package.with_derived_url()
    }

    /// Build a branch head package. The commit SHA is resolved separately.
    pub fn branch(organisation: &str, repository: &str, branch: &str) -> Self {
        Self::base(PackageKind::Branch, organisation, repository, branch).with_derived_url()
    }

    /// Build a package for a user-supplied archive. It has no download URL.
    pub fn from_archive(organisation: &str, repository: &str, name: &str) -> Self {
        Self::base(PackageKind::FromArchive, organisation, repository, name)
    }

    pub const fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag (releases) or branch name (branches and pull requests).
    pub fn branch_name(&self) -> &str {
        &self.branch
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub const fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    /// Changelog / pull request page.
    pub fn changelog_url(&self) -> &str {
        &self.html_url
    }

    pub const fn pull_number(&self) -> Option<u64> {
        self.pull_number
    }

    /// Source archive URL; `None` for user-supplied archives.
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    pub const fn asset_project(&self) -> Option<&Asset> {
        self.asset_project.as_ref()
    }

    pub const fn asset_plugin(&self) -> Option<&Asset> {
        self.asset_plugin.as_ref()
    }

    /// Resolved commit SHA, if known.
    pub fn commit_sha(&self) -> Option<&str> {
        self.commit_sha.get().map(String::as_str)
    }

    /// Record the resolved commit SHA.
    ///
    /// Returns `false` if a SHA was already recorded; the first one wins.
    pub fn set_commit_sha(&self, sha: impl Into<String>) -> bool {
        self.commit_sha.set(sha.into()).is_ok()
    }

    /// Whether installing this package puts the module in beta testing.
    pub const fn is_unstable(&self) -> bool {
        match self.kind {
            PackageKind::Branch | PackageKind::PullRequest => true,
            PackageKind::Release => self.prerelease,
            PackageKind::FromArchive => false,
        }
    }

    /// Name for version pickers.
    pub fn display_name(&self) -> String {
        if self.prerelease {
            format!("{} (prerelease)", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Snapshot archive URL for a ref of `organisation/repository`.
fn archive_url(organisation: &str, repository: &str, kind: PackageKind, branch: &str) -> String {
    let ref_kind = match kind {
        PackageKind::Release => "tags",
        _ => "heads",
    };
    format!("{ARCHIVE_HOST}/{organisation}/{repository}/archive/refs/{ref_kind}/{branch}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{HeadRepository, PullRequestHead, RepositoryOwner};

    fn release(tag: &str, name: Option<&str>) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: tag.to_string(),
            name: name.map(str::to_string),
            created_at: None,
            prerelease: false,
            html_url: format!("https://github.com/org/repo/releases/tag/{tag}"),
            assets: vec![],
        }
    }

    fn pull_request(fork: Option<(&str, &str)>) -> PullRequestRecord {
        PullRequestRecord {
            number: 128,
            title: "Add the thing".to_string(),
            head: PullRequestHead {
                ref_name: "feature-x".to_string(),
                sha: Some("abcdef0123456789".to_string()),
                repo: Some(match fork {
                    Some((login, name)) => HeadRepository {
                        fork: true,
                        name: name.to_string(),
                        owner: RepositoryOwner {
                            login: login.to_string(),
                        },
                    },
                    None => HeadRepository {
                        fork: false,
                        name: "repo".to_string(),
                        owner: RepositoryOwner {
                            login: "org".to_string(),
                        },
                    },
                }),
            },
            created_at: None,
            html_url: "https://github.com/org/repo/pull/128".to_string(),
        }
    }

    #[test]
    fn test_release_download_url_uses_tags() {
        let package = Package::from_release("opengisch", "tww", &release("v2.0.1", None));
        assert_eq!(
            package.download_url(),
            Some("https://github.com/opengisch/tww/archive/refs/tags/v2.0.1.zip")
        );
    }

    #[test]
    fn test_branch_download_url_uses_heads() {
        let package = Package::branch("opengisch", "tww", "main");
        assert_eq!(
            package.download_url(),
            Some("https://github.com/opengisch/tww/archive/refs/heads/main.zip")
        );
        assert!(package.commit_sha().is_none());
    }

    #[test]
    fn test_release_name_falls_back_to_tag() {
        assert_eq!(Package::from_release("o", "r", &release("v1", Some(""))).name(), "v1");
        assert_eq!(Package::from_release("o", "r", &release("v1", None)).name(), "v1");
        assert_eq!(
            Package::from_release("o", "r", &release("v1", Some("Release One"))).name(),
            "Release One"
        );
    }

    #[test]
    fn test_release_assets_by_label() {
        let mut record = release("v1.0.0", None);
        record.assets = vec![
            ReleaseAssetRecord {
                name: "tww-project.zip".to_string(),
                label: Some("project".to_string()),
                browser_download_url: "https://example.com/project.zip".to_string(),
                size: 10,
            },
            ReleaseAssetRecord {
                name: "tww-plugin.zip".to_string(),
                label: Some("plugin".to_string()),
                browser_download_url: "https://example.com/plugin.zip".to_string(),
                size: 20,
            },
            ReleaseAssetRecord {
                name: "notes.txt".to_string(),
                label: None,
                browser_download_url: "https://example.com/notes.txt".to_string(),
                size: 1,
            },
        ];

        let package = Package::from_release("o", "r", &record);
        assert_eq!(package.asset_project().unwrap().size, 10);
        assert_eq!(package.asset_plugin().unwrap().kind, AssetKind::Plugin);
    }

    #[test]
    fn test_pull_request_from_fork_targets_fork() {
        let package = Package::from_pull_request(
            "opengisch",
            "upstream",
            &pull_request(Some(("alice", "fork-repo"))),
        );

        assert_eq!(package.organisation(), "alice");
        assert_eq!(package.repository(), "fork-repo");
        assert_eq!(
            package.download_url(),
            Some("https://github.com/alice/fork-repo/archive/refs/heads/feature-x.zip")
        );
        assert_eq!(package.name(), "#128 Add the thing");
        assert_eq!(package.commit_sha(), Some("abcdef0123456789"));
    }

    #[test]
    fn test_pull_request_from_same_repo_keeps_upstream() {
        let package = Package::from_pull_request("org", "repo", &pull_request(None));
        assert_eq!(package.organisation(), "org");
        assert_eq!(package.pull_number(), Some(128));
        assert!(package.is_unstable());
    }

    #[test]
    fn test_commit_sha_shared_between_clones() {
        let package = Package::branch("o", "r", "main");
        let clone = package.clone();

        assert!(package.set_commit_sha("1234567890"));
        assert!(!clone.set_commit_sha("ffff"));
        assert_eq!(clone.commit_sha(), Some("1234567890"));
    }

    #[test]
    fn test_from_archive_has_no_url() {
        let package = Package::from_archive("o", "r", "tww-2.0.zip");
        assert!(package.download_url().is_none());
        assert!(!package.is_unstable());
    }

    #[test]
    fn test_display_name_marks_prerelease() {
        let mut record = release("v3.0.0-rc1", None);
        record.prerelease = true;
        let package = Package::from_release("o", "r", &record);
        assert_eq!(package.display_name(), "v3.0.0-rc1 (prerelease)");
        assert!(package.is_unstable());
    }

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in [
            PackageKind::Release,
            PackageKind::Branch,
            PackageKind::PullRequest,
            PackageKind::FromArchive,
        ] {
            assert_eq!(kind.as_str().parse::<PackageKind>(), Ok(kind));
        }
        assert!("tag".parse::<PackageKind>().is_err());
    }
}
