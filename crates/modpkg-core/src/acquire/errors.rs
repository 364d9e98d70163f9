//! Package acquisition error types.
//!
//! These errors are serializable and do not depend on external error types
//! like `std::io::Error`. For I/O errors, we capture the kind and message as
//! strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for package acquisition.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AcquireError {
    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Network/HTTP error during download.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// A zip archive is missing, truncated or unreadable.
    #[error("Invalid archive {path}: {reason}")]
    ArchiveInvalid {
        /// Path of the offending archive.
        path: String,
        /// What went wrong while opening or extracting it.
        reason: String,
    },

    /// The package has nothing to download (no source URL and no archive).
    #[error("Package '{name}' has no downloadable source")]
    MissingSource { name: String },

    /// Acquisition was cancelled by the caller.
    #[error("Package preparation cancelled")]
    Cancelled,

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl AcquireError {
    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an invalid-archive error.
    pub fn archive_invalid(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::ArchiveInvalid {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create a general error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error represents a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text suitable for a user-facing error dialog.
    ///
    /// Returns `None` for cancellations, which callers report as a neutral
    /// status rather than an error.
    pub fn user_message(&self) -> Option<String> {
        if self.is_cancelled() {
            return None;
        }
        Some(format!("Can't prepare the package: {self}"))
    }
}

impl From<std::io::Error> for AcquireError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_error_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = AcquireError::from(io);
        assert!(matches!(err, AcquireError::Io { ref kind, .. } if kind == "PermissionDenied"));
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(AcquireError::Cancelled.is_cancelled());
        assert!(!AcquireError::network("reset").is_cancelled());
        assert!(AcquireError::Cancelled.user_message().is_none());
    }

    #[test]
    fn test_user_message_includes_raw_text() {
        let err = AcquireError::network_with_status("HTTP 502", 502);
        let msg = err.user_message().unwrap();
        assert!(msg.contains("HTTP 502"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let err = AcquireError::archive_invalid(std::path::Path::new("/tmp/a.zip"), "bad header");
        let json = serde_json::to_string(&err).unwrap();
        let back: AcquireError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
