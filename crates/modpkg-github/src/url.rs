//! URL construction helpers for the GitHub REST API.
//!
//! Pure functions so that every request URL is built the same way.

use crate::error::{GithubError, GithubResult};
use crate::models::GithubConfig;
use url::Url;

/// Build `{base}/repos/{org}/{repo}/{tail}`.
fn build_repo_url(config: &GithubConfig, org: &str, repo: &str, tail: &str) -> GithubResult<Url> {
    if config.base_url.cannot_be_a_base() {
        return Err(GithubError::InvalidBaseUrl {
            message: config.base_url.to_string(),
        });
    }

    let mut url = config.base_url.clone();
    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!(
        "{base_path}/repos/{}/{}/{tail}",
        urlencoding::encode(org),
        urlencoding::encode(repo)
    ));
    url.set_query(None);
    Ok(url)
}

/// First page of the releases listing.
pub fn build_releases_url(config: &GithubConfig, org: &str, repo: &str) -> GithubResult<Url> {
    let mut url = build_repo_url(config, org, repo, "releases")?;
    url.set_query(Some(&format!("per_page={}", config.per_page)));
    Ok(url)
}

/// First page of the open pull requests listing.
pub fn build_pulls_url(config: &GithubConfig, org: &str, repo: &str) -> GithubResult<Url> {
    let mut url = build_repo_url(config, org, repo, "pulls")?;
    url.set_query(Some(&format!("state=open&per_page={}", config.per_page)));
    Ok(url)
}

/// Commit lookup for a branch, tag or SHA.
pub fn build_commit_url(
    config: &GithubConfig,
    org: &str,
    repo: &str,
    git_ref: &str,
) -> GithubResult<Url> {
    let tail = format!("commits/{}", urlencoding::encode(git_ref));
    build_repo_url(config, org, repo, &tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GithubConfig {
        GithubConfig::default()
    }

    #[test]
    fn test_build_releases_url() {
        let url = build_releases_url(&config(), "opengisch", "tww").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/opengisch/tww/releases?per_page=100"
        );
    }

    #[test]
    fn test_build_pulls_url() {
        let url = build_pulls_url(&config(), "opengisch", "tww").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/opengisch/tww/pulls?state=open&per_page=100"
        );
    }

    #[test]
    fn test_build_commit_url_encodes_ref() {
        let url = build_commit_url(&config(), "o", "r", "feature/x").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/o/r/commits/feature%2Fx"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let config = GithubConfig {
            base_url: Url::parse("https://ghe.example.com/api/v3/").unwrap(),
            ..config()
        };
        let url = build_commit_url(&config, "o", "r", "main").unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/o/r/commits/main");
    }

    #[test]
    fn test_cannot_be_a_base_url_is_rejected() {
        let config = GithubConfig {
            base_url: Url::parse("mailto:someone@example.com").unwrap(),
            ..config()
        };
        assert!(matches!(
            build_releases_url(&config, "o", "r"),
            Err(GithubError::InvalidBaseUrl { .. })
        ));
    }
}
