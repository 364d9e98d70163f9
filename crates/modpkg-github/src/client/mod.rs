//! GitHub client for listing releases, pull requests and branch heads.

mod listing;

use crate::config::GithubClientConfig;
use crate::error::{GithubError, GithubResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::GithubConfig;
use url::Url;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default GitHub client using the reqwest HTTP backend.
pub type DefaultGithubClient = GithubClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the GitHub REST API.
///
/// Generic over an HTTP backend so tests can inject canned responses. Use
/// `DefaultGithubClient` in production code.
pub struct GithubClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: GithubConfig,
}

impl DefaultGithubClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &GithubClientConfig) -> Result<Self, modpkg_core::RemoteError> {
        Self::try_new(config).map_err(crate::port::map_error)
    }

    fn try_new(config: &GithubClientConfig) -> GithubResult<Self> {
        let internal_config = Self::to_internal_config(config)?;
        let backend = ReqwestBackend::new(&internal_config)?;
        Ok(Self {
            backend,
            config: internal_config,
        })
    }

    fn to_internal_config(config: &GithubClientConfig) -> GithubResult<GithubConfig> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            GithubError::InvalidBaseUrl {
                message: format!("{}: {e}", config.api_base_url),
            }
        })?;
        if config.token.is_none() {
            tracing::info!(
                target: "modpkg.github",
                "No GitHub token configured, requests are subject to the anonymous rate limit"
            );
        }
        Ok(GithubConfig {
            base_url,
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            per_page: config.per_page,
            max_pages: config.max_pages,
        })
    }
}

impl<B: HttpBackend> GithubClient<B> {
    /// Create a new client with a custom backend.
    #[cfg(test)]
    pub(crate) const fn with_backend(config: GithubConfig, backend: B) -> Self {
        Self { backend, config }
    }
}
