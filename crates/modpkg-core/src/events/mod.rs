//! Canonical event union delivered to callers.
//!
//! # Structure
//!
//! - `versions` - Release and development channel completion
//! - `packaging` - Package acquisition progress and completion
//! - `operation` - Migration operation progress and completion
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "packaging_progress", "percent": 42.0, "bytesDownloaded": 1048576 }
//! ```

mod operation;
mod packaging;
mod versions;

use serde::{Deserialize, Serialize};

pub use packaging::INDETERMINATE_PERCENT;

use crate::acquire::AcquireError;
use crate::domain::ChannelError;

/// Canonical event types for all adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    // ========== Version Events ==========
    /// The release channel of a module finished loading.
    VersionsLoaded {
        #[serde(rename = "moduleId")]
        module_id: String,
        /// `None` on success.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<ChannelError>,
    },

    /// The development channel of a module finished loading.
    DevelopmentVersionsLoaded {
        #[serde(rename = "moduleId")]
        module_id: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<ChannelError>,
    },

    // ========== Packaging Events ==========
    /// Download progress of a package acquisition.
    PackagingProgress {
        /// Percentage in `0.0..=100.0`, or `-1.0` when the total size is
        /// unknown.
        percent: f64,
        /// Bytes received so far in this run.
        #[serde(rename = "bytesDownloaded")]
        bytes_downloaded: u64,
    },

    /// A package acquisition run ended.
    PackagingFinished {
        /// `None` on success; `Some(AcquireError::Cancelled)` when stopped on
        /// request.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<AcquireError>,
    },

    // ========== Operation Events ==========
    /// Progress reported by the migration engine.
    OperationProgress {
        message: String,
        current: u64,
        total: u64,
    },

    /// A migration operation ended.
    OperationFinished {
        success: bool,
        #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none", default)]
        error_message: Option<String>,
    },
}

impl AppEvent {
    /// Get the event name for wire protocols.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::VersionsLoaded { .. } => "versions:loaded",
            Self::DevelopmentVersionsLoaded { .. } => "versions:development_loaded",
            Self::PackagingProgress { .. } => "packaging:progress",
            Self::PackagingFinished { .. } => "packaging:finished",
            Self::OperationProgress { .. } => "operation:progress",
            Self::OperationFinished { .. } => "operation:finished",
        }
    }
}
