//! Internal error types for GitHub operations.
//!
//! These errors are internal to `modpkg-github` and are mapped to core port
//! errors at the boundary.

use thiserror::Error;

/// Result type alias for GitHub operations.
pub type GithubResult<T> = Result<T, GithubError>;

/// Errors related to GitHub API operations.
#[derive(Debug, Error)]
pub enum GithubError {
    /// API request failed with an HTTP error status.
    #[error("GitHub API request failed with status {status}: {body}")]
    ApiRequestFailed {
        status: u16,
        url: String,
        /// Response body, truncated.
        body: String,
    },

    /// The request quota is exhausted.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// API returned an invalid or unexpected response.
    #[error("Invalid response from GitHub API: {message}")]
    InvalidResponse { message: String },

    /// The configured base URL cannot be used to build request URLs.
    #[error("Invalid API base URL: {message}")]
    InvalidBaseUrl { message: String },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
