//! Package acquisition events.

use super::AppEvent;
use crate::acquire::AcquireError;

/// Percent value signalling that the total download size is unknown.
pub const INDETERMINATE_PERCENT: f64 = -1.0;

impl AppEvent {
    /// Create a packaging progress event.
    pub const fn packaging_progress(percent: f64, bytes_downloaded: u64) -> Self {
        Self::PackagingProgress {
            percent,
            bytes_downloaded,
        }
    }

    /// Create an indeterminate packaging progress event.
    pub const fn packaging_indeterminate(bytes_downloaded: u64) -> Self {
        Self::packaging_progress(INDETERMINATE_PERCENT, bytes_downloaded)
    }

    /// Create a packaging completion event.
    pub const fn packaging_finished(error: Option<AcquireError>) -> Self {
        Self::PackagingFinished { error }
    }

    /// Whether this is a progress event without a known total.
    pub fn is_indeterminate_progress(&self) -> bool {
        matches!(self, Self::PackagingProgress { percent, .. } if *percent < 0.0)
    }
}
