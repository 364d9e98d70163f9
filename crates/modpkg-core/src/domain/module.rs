//! A module and its two version channels.

use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;

use super::channel::{ChannelError, ChannelState};
use super::package::Package;
use crate::config::ModuleConfig;
use crate::ports::ReleaseRecord;

/// Result of parsing a release listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseListing {
    /// Non-excluded releases in listing order.
    pub versions: Vec<Package>,
    /// Most recent stable release.
    pub latest: Option<Package>,
}

#[derive(Debug, Default)]
struct ModuleState {
    releases: ChannelState,
    versions: Vec<Package>,
    latest_version: Option<Package>,
    development: ChannelState,
    development_versions: Vec<Package>,
}

/// A versioned module tracked in a remote repository.
///
/// Identity is (organisation, repository, id). Version lists are filled lazily
/// by the resolver and may be reloaded at any time; accessors return
/// snapshots.
#[derive(Debug)]
pub struct Module {
    id: String,
    name: String,
    organisation: String,
    repository: String,
    exclude_releases: Option<Regex>,
    experimental: bool,
    state: Mutex<ModuleState>,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organisation: organisation.into(),
            repository: repository.into(),
            exclude_releases: None,
            experimental: false,
            state: Mutex::new(ModuleState::default()),
        }
    }

    /// Build a module from its configuration entry.
    pub fn from_config(config: &ModuleConfig) -> Self {
        let module = Self::new(
            &config.id,
            &config.name,
            &config.organisation,
            &config.repository,
        )
        .with_experimental(config.experimental);
        match config.exclude_releases.as_deref() {
            Some(pattern) => module.with_exclude_releases(pattern),
            None => module,
        }
    }

    /// Drop releases whose tag matches `pattern`.
    ///
    /// An invalid pattern is logged and ignored.
    #[must_use]
    pub fn with_exclude_releases(mut self, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => self.exclude_releases = Some(regex),
            Err(e) => {
                tracing::error!(
                    target: "modpkg.versions",
                    module = %self.id,
                    pattern,
                    error = %e,
                    "Invalid exclude_releases pattern, releases will not be filtered"
                );
                self.exclude_releases = None;
            }
        }
        self
    }

    #[must_use]
    pub const fn with_experimental(mut self, experimental: bool) -> Self {
        self.experimental = experimental;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub const fn is_experimental(&self) -> bool {
        self.experimental
    }

    pub fn display_name(&self) -> String {
        if self.experimental {
            format!("{} (experimental)", self.name)
        } else {
            self.name.clone()
        }
    }

    fn state(&self) -> MutexGuard<'_, ModuleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn versions(&self) -> Vec<Package> {
        self.state().versions.clone()
    }

    pub fn latest_version(&self) -> Option<Package> {
        self.state().latest_version.clone()
    }

    pub fn development_versions(&self) -> Vec<Package> {
        self.state().development_versions.clone()
    }

    pub fn release_state(&self) -> ChannelState {
        self.state().releases.clone()
    }

    pub fn development_state(&self) -> ChannelState {
        self.state().development.clone()
    }

    /// Last error of the release channel.
    pub fn last_error(&self) -> Option<ChannelError> {
        self.state().releases.error().cloned()
    }

    /// Last error of the development channel.
    pub fn development_last_error(&self) -> Option<ChannelError> {
        self.state().development.error().cloned()
    }

    /// Loaded prereleases, in release listing order.
    pub fn prereleases(&self) -> Vec<Package> {
        self.state()
            .versions
            .iter()
            .filter(|p| p.is_prerelease())
            .cloned()
            .collect()
    }

    /// Find a loaded package by name or tag across both channels.
    pub fn find_version(&self, name: &str) -> Option<Package> {
        let state = self.state();
        state
            .versions
            .iter()
            .chain(state.development_versions.iter())
            .find(|p| p.name() == name || p.branch_name() == name)
            .cloned()
    }

    // ========================================================================
    // Channel transitions
    // ========================================================================

    /// Move the release channel to `Loading`. Returns `false` if a load is
    /// already outstanding.
    pub(crate) fn begin_release_load(&self) -> bool {
        let mut state = self.state();
        if state.releases.is_loading() {
            return false;
        }
        state.releases = ChannelState::Loading;
        true
    }

    pub(crate) fn complete_release_load(&self, result: Result<ReleaseListing, ChannelError>) {
        let mut state = self.state();
        match result {
            Ok(listing) => {
                state.versions = listing.versions;
                state.latest_version = listing.latest;
                state.releases = ChannelState::Loaded { error: None };
            }
            Err(error) => {
                state.versions.clear();
                state.latest_version = None;
                state.releases = ChannelState::Loaded { error: Some(error) };
            }
        }
    }

    pub(crate) fn begin_development_load(&self) -> bool {
        let mut state = self.state();
        if state.development.is_loading() {
            return false;
        }
        state.development = ChannelState::Loading;
        true
    }

    pub(crate) fn complete_development_load(
        &self,
        versions: Vec<Package>,
        error: Option<ChannelError>,
    ) {
        let mut state = self.state();
        state.development_versions = versions;
        state.development = ChannelState::Loaded { error };
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Turn a release listing into packages.
    ///
    /// Releases whose tag matches the exclusion pattern are dropped. The
    /// latest version is the first stable release seen, replaced only by a
    /// stable release with a strictly later creation time, so ties keep the
    /// earlier entry regardless of listing order.
    pub fn parse_releases(&self, records: &[ReleaseRecord]) -> ReleaseListing {
        let mut listing = ReleaseListing::default();

        for record in records {
            if let Some(exclude) = &self.exclude_releases {
                if exclude.is_match(&record.tag_name) {
                    tracing::debug!(
                        target: "modpkg.versions",
                        module = %self.id,
                        tag = %record.tag_name,
                        "Release excluded"
                    );
                    continue;
                }
            }

            let package = Package::from_release(&self.organisation, &self.repository, record);
            if !package.is_prerelease() {
                let newer = listing
                    .latest
                    .as_ref()
                    .is_none_or(|latest| package.created_at() > latest.created_at());
                if newer {
                    listing.latest = Some(package.clone());
                }
            }
            listing.versions.push(package);
        }

        listing
    }
}
