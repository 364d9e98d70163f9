//! Version channel events.

use super::AppEvent;
use crate::domain::ChannelError;

impl AppEvent {
    /// Create a release-channel completion event.
    pub fn versions_loaded(module_id: impl Into<String>, error: Option<ChannelError>) -> Self {
        Self::VersionsLoaded {
            module_id: module_id.into(),
            error,
        }
    }

    /// Create a development-channel completion event.
    pub fn development_versions_loaded(
        module_id: impl Into<String>,
        error: Option<ChannelError>,
    ) -> Self {
        Self::DevelopmentVersionsLoaded {
            module_id: module_id.into(),
            error,
        }
    }
}
