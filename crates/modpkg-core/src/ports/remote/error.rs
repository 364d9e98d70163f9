//! Error types for the remote version source port.
//!
//! Adapters map their internal errors to these variants at the boundary.

use thiserror::Error;

/// Result type alias for remote version source operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Phrase the remote host puts in responses once the request quota is used up.
const RATE_LIMIT_PHRASE: &str = "rate limit exceeded";

/// Errors surfaced by a remote version source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request quota of the remote host is exhausted.
    #[error("API rate limit exceeded: {message}")]
    RateLimited {
        /// Raw message returned by the host.
        message: String,
    },

    /// Non-2xx response.
    #[error("Request failed with status {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Client misconfiguration, e.g. an unparsable base URL.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl RemoteError {
    /// Whether this error indicates rate-limit exhaustion.
    ///
    /// Also matches `Http` errors whose body carries the rate-limit phrase,
    /// since hosts do not always use a dedicated status code.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            other => is_rate_limit_message(&other.to_string()),
        }
    }
}

/// Detect the rate-limit phrase in arbitrary error text.
pub fn is_rate_limit_message(text: &str) -> bool {
    text.to_lowercase().contains(RATE_LIMIT_PHRASE)
}
