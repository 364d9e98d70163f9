//! Load state of a module's version channels.

use serde::{Deserialize, Serialize};

use crate::ports::{RemoteError, is_rate_limit_message};

/// Remediation shown when the remote host refused a request for quota reasons.
pub const RATE_LIMIT_REMEDIATION: &str = "The GitHub API rate limit has been exceeded. \
Unauthenticated requests are limited to 60 per hour. Create a personal access \
token on GitHub (Settings > Developer settings > Personal access tokens), then \
configure it (for example through the MODPKG_GITHUB_TOKEN environment variable) \
and try again.";

/// Failure recorded on a channel after an unsuccessful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelError {
    /// Raw error text.
    pub message: String,
    /// The failure was caused by rate-limit exhaustion.
    #[serde(rename = "rateLimited", default)]
    pub rate_limited: bool,
}

impl ChannelError {
    /// Create an error from text, detecting the rate-limit phrase.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let rate_limited = is_rate_limit_message(&message);
        Self {
            message,
            rate_limited,
        }
    }

    /// Text for a user-facing error dialog.
    pub fn user_message(&self) -> String {
        if self.rate_limited {
            format!("{RATE_LIMIT_REMEDIATION}\n\nDetails: {}", self.message)
        } else {
            format!("Can't load versions: {}", self.message)
        }
    }
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<RemoteError> for ChannelError {
    fn from(err: RemoteError) -> Self {
        Self {
            rate_limited: err.is_rate_limited(),
            message: err.to_string(),
        }
    }
}

/// Load state of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Unloaded,
    Loading,
    /// Finished loading; `error` is the channel's last error.
    Loaded { error: Option<ChannelError> },
}

impl ChannelState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Last error, if the channel finished loading with one.
    pub const fn error(&self) -> Option<&ChannelError> {
        match self {
            Self::Loaded { error } => error.as_ref(),
            _ => None,
        }
    }
}
