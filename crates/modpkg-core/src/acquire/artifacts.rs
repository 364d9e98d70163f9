//! Local artifact slots filled in by an acquisition run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One of the three archives a package can be made of.
///
/// Processed in declaration order: source, then project, then plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSlot {
    /// The repository snapshot itself.
    Source,
    /// Release asset labelled `project`.
    Project,
    /// Release asset labelled `plugin`.
    Plugin,
}

impl ArtifactSlot {
    /// All slots in processing order.
    pub const ALL: [Self; 3] = [Self::Source, Self::Project, Self::Plugin];

    /// Stem used for the cached archive name.
    pub const fn archive_stem(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Project => "project",
            Self::Plugin => "plugin",
        }
    }

    /// Short directory name the archive is extracted into.
    pub const fn extract_dir_name(self) -> &'static str {
        match self {
            Self::Source => "src",
            Self::Project => "project",
            Self::Plugin => "plugin",
        }
    }
}

/// Local paths of one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPaths {
    /// Downloaded (or supplied) archive.
    pub archive: Option<PathBuf>,
    /// Extracted directory.
    pub dir: Option<PathBuf>,
}

/// Paths produced by an acquisition run.
///
/// Populated progressively as each slot completes and never rolled back on
/// failure. A caller must check the run's error before trusting any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageArtifacts {
    pub source: SlotPaths,
    pub project: SlotPaths,
    pub plugin: SlotPaths,
}

impl PackageArtifacts {
    /// Paths of `slot`.
    pub const fn slot(&self, slot: ArtifactSlot) -> &SlotPaths {
        match slot {
            ArtifactSlot::Source => &self.source,
            ArtifactSlot::Project => &self.project,
            ArtifactSlot::Plugin => &self.plugin,
        }
    }

    /// Mutable paths of `slot`.
    pub const fn slot_mut(&mut self, slot: ArtifactSlot) -> &mut SlotPaths {
        match slot {
            ArtifactSlot::Source => &mut self.source,
            ArtifactSlot::Project => &mut self.project,
            ArtifactSlot::Plugin => &mut self.plugin,
        }
    }

    /// Extracted source directory, if the source slot completed.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source.dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_order() {
        assert_eq!(
            ArtifactSlot::ALL,
            [ArtifactSlot::Source, ArtifactSlot::Project, ArtifactSlot::Plugin]
        );
    }

    #[test]
    fn test_slot_mut_updates_matching_slot() {
        let mut artifacts = PackageArtifacts::default();
        artifacts.slot_mut(ArtifactSlot::Plugin).dir = Some(PathBuf::from("/tmp/plugin"));

        assert!(artifacts.slot(ArtifactSlot::Source).dir.is_none());
        assert_eq!(
            artifacts.plugin.dir.as_deref(),
            Some(Path::new("/tmp/plugin"))
        );
    }
}
