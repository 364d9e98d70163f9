//! Public configuration for the GitHub client.

use std::time::Duration;

/// Configuration for the GitHub client.
///
/// # Example
///
/// ```
/// use modpkg_github::GithubClientConfig;
/// use std::time::Duration;
///
/// let config = GithubClientConfig::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_token("ghp_example");
/// ```
#[derive(Debug, Clone)]
pub struct GithubClientConfig {
    /// Base URL of the REST API
    pub(crate) api_base_url: String,
    /// User agent string; GitHub rejects requests without one
    pub(crate) user_agent: String,
    /// Request timeout
    pub(crate) timeout: Duration,
    /// Optional personal access token
    pub(crate) token: Option<String>,
    /// Items requested per page on list endpoints
    pub(crate) per_page: u8,
    /// Maximum number of pages followed on list endpoints
    pub(crate) max_pages: u16,
}

impl Default for GithubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: concat!("modpkg/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            token: None,
            per_page: 100,
            max_pages: 1,
        }
    }
}

impl GithubClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL (GitHub Enterprise, test servers).
    ///
    /// Defaults to `https://api.github.com`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a personal access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set an optional token. Empty strings count as no token.
    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Items per page on list endpoints, clamped to GitHub's 1..=100.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Number of pages followed on list endpoints (at least one).
    ///
    /// Defaults to 1, i.e. one request per listing.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u16) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}
