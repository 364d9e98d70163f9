//! Migration operation events.

use super::AppEvent;

impl AppEvent {
    /// Create an operation progress event.
    pub fn operation_progress(message: impl Into<String>, current: u64, total: u64) -> Self {
        Self::OperationProgress {
            message: message.into(),
            current,
            total,
        }
    }

    /// Create an operation completion event.
    pub const fn operation_finished(success: bool, error_message: Option<String>) -> Self {
        Self::OperationFinished {
            success,
            error_message,
        }
    }
}
