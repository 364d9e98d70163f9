//! CLI-specific error types and exit codes.

use modpkg_core::{AcquireError, ChannelError, ConfigError, PathError, RemoteError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument error (unknown module, unknown version, ...).
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Versions could not be loaded.
    #[error("{}", .0.user_message())]
    Versions(ChannelError),

    /// Package acquisition failed.
    #[error("Package preparation failed: {0}")]
    Acquire(AcquireError),

    /// The user interrupted the command.
    #[error("canceled")]
    Cancelled,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 64-78: see sysexits.h
    /// - 130: interrupted (128 + SIGINT)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Versions(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Cancelled => 130,
            Self::Acquire(AcquireError::Io { .. }) => 74,
            Self::Acquire(_) => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RemoteError> for CliError {
    fn from(err: RemoteError) -> Self {
        Self::Versions(ChannelError::from(err))
    }
}

impl From<AcquireError> for CliError {
    fn from(err: AcquireError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Acquire(err)
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpkg_core::RATE_LIMIT_REMEDIATION;

    #[test]
    fn test_rate_limit_prints_remediation() {
        let err = CliError::Versions(ChannelError::new("API rate limit exceeded for 1.2.3.4"));
        let text = err.to_string();
        assert!(text.starts_with(RATE_LIMIT_REMEDIATION));
        assert!(text.contains("1.2.3.4"));
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_cancellation_maps_to_sigint_status() {
        let err = CliError::from(AcquireError::Cancelled);
        assert!(matches!(err, CliError::Cancelled));
        assert_eq!(err.to_string(), "canceled");
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn test_acquire_io_errors_use_ioerr() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CliError::from(AcquireError::from_io_error(&io));
        assert_eq!(err.exit_code(), 74);
        assert_eq!(CliError::from(AcquireError::other("boom")).exit_code(), 1);
    }
}
