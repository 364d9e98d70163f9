//! Migration operation error types.

use thiserror::Error;

/// Errors produced while running a migration operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The engine configuration belongs to another module.
    #[error("Module mismatch: expected '{expected}', engine is configured for '{found}'")]
    ConfigMismatch { expected: String, found: String },

    /// The migration engine failed.
    #[error("{message}")]
    Engine { message: String },

    /// An operation is already running on this runner.
    #[error("An operation is already running")]
    Busy,

    /// The engine observed the cancellation flag and stopped.
    #[error("Operation cancelled")]
    Cancelled,

    /// The worker ignored cancellation and was detached. The database may be
    /// left in an inconsistent state.
    #[error("Operation abandoned after cancellation timeout")]
    Abandoned,

    #[error("{message}")]
    Other { message: String },
}

impl OperationError {
    pub fn engine(err: &anyhow::Error) -> Self {
        Self::Engine {
            message: format!("{err:#}"),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the operation stopped on request rather than failing.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Abandoned)
    }
}
