//! Module version resolver.
//!
//! Fills a module's release and development channels using the metadata
//! cache first and the remote version source on a miss. Failures never escape
//! a load: they are recorded as the channel's last error and reported in the
//! completion event.

use std::sync::Arc;

use crate::cache::{CacheKind, MetadataCache};
use crate::domain::{ChannelError, Module, Package};
use crate::events::AppEvent;
use crate::ports::{AppEventEmitter, PullRequestRecord, ReleaseRecord, RemoteVersionSource};

/// Branch synthesized at the head of the development channel.
const DEVELOPMENT_BRANCH: &str = "main";

/// What a load call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Another load of the same channel was outstanding; nothing was done.
    AlreadyLoading,
    /// The channel was (re)loaded; `error` mirrors the channel's last error.
    Completed { error: Option<ChannelError> },
}

/// Loads module versions with a cache-or-fetch policy.
#[derive(Clone)]
pub struct VersionResolver {
    source: Arc<dyn RemoteVersionSource>,
    cache: MetadataCache,
    emitter: Arc<dyn AppEventEmitter>,
}

impl VersionResolver {
    pub fn new(
        source: Arc<dyn RemoteVersionSource>,
        cache: MetadataCache,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            source,
            cache,
            emitter,
        }
    }

    // ========================================================================
    // Release channel
    // ========================================================================

    /// Start loading the release channel in the background.
    ///
    /// Must be called within a tokio runtime. Returns `false` if a release
    /// load is already outstanding for this module. Completion is signalled
    /// with [`AppEvent::VersionsLoaded`].
    pub fn start_load_versions(&self, module: &Arc<Module>) -> bool {
        if !module.begin_release_load() {
            return false;
        }
        let resolver = self.clone();
        let module = Arc::clone(module);
        tokio::spawn(async move {
            resolver.run_release_load(&module).await;
        });
        true
    }

    /// Load the release channel and wait for it.
    pub async fn load_versions(&self, module: &Module) -> LoadOutcome {
        if !module.begin_release_load() {
            return LoadOutcome::AlreadyLoading;
        }
        let error = self.run_release_load(module).await;
        LoadOutcome::Completed { error }
    }

    async fn run_release_load(&self, module: &Module) -> Option<ChannelError> {
        let result = self
            .release_records(module)
            .await
            .map(|records| module.parse_releases(&records));

        let error = match &result {
            Ok(listing) => {
                tracing::info!(
                    target: "modpkg.versions",
                    module = %module.id(),
                    count = listing.versions.len(),
                    latest = listing.latest.as_ref().map(Package::name),
                    "Releases loaded"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    target: "modpkg.versions",
                    module = %module.id(),
                    error = %e,
                    rate_limited = e.rate_limited,
                    "Failed to load releases"
                );
                Some(e.clone())
            }
        };

        module.complete_release_load(result);
        self.emitter
            .emit(AppEvent::versions_loaded(module.id(), error.clone()));
        error
    }

    async fn release_records(&self, module: &Module) -> Result<Vec<ReleaseRecord>, ChannelError> {
        let (org, repo) = (module.organisation(), module.repository());
        if let Some(records) = self.cache.read(org, repo, CacheKind::Releases).await {
            tracing::debug!(target: "modpkg.versions", org, repo, "Using cached releases");
            return Ok(records);
        }

        let records = self.source.fetch_releases(org, repo).await?;
        self.cache
            .write(org, repo, CacheKind::Releases, &records)
            .await;
        Ok(records)
    }

    // ========================================================================
    // Development channel
    // ========================================================================

    /// Start loading the development channel in the background.
    ///
    /// Must be called within a tokio runtime. Completion is signalled with
    /// [`AppEvent::DevelopmentVersionsLoaded`].
    pub fn start_load_development_versions(&self, module: &Arc<Module>) -> bool {
        if !module.begin_development_load() {
            return false;
        }
        let resolver = self.clone();
        let module = Arc::clone(module);
        tokio::spawn(async move {
            resolver.run_development_load(&module).await;
        });
        true
    }

    /// Load the development channel and wait for it.
    ///
    /// The commit SHA of the `main` branch package may still be resolving when
    /// this returns; await [`Self::resolve_commit_sha`] before keying artifacts
    /// on it.
    pub async fn load_development_versions(&self, module: &Module) -> LoadOutcome {
        if !module.begin_development_load() {
            return LoadOutcome::AlreadyLoading;
        }
        let error = self.run_development_load(module).await;
        LoadOutcome::Completed { error }
    }

    async fn run_development_load(&self, module: &Module) -> Option<ChannelError> {
        let main = Package::branch(
            module.organisation(),
            module.repository(),
            DEVELOPMENT_BRANCH,
        );
        self.spawn_commit_lookup(&main);

        let mut versions = vec![main];
        versions.extend(module.prereleases());

        let error = match self.pull_request_records(module).await {
            Ok(records) => {
                versions.extend(records.iter().map(|record| {
                    Package::from_pull_request(module.organisation(), module.repository(), record)
                }));
                tracing::info!(
                    target: "modpkg.versions",
                    module = %module.id(),
                    count = versions.len(),
                    "Development versions loaded"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    target: "modpkg.versions",
                    module = %module.id(),
                    error = %e,
                    rate_limited = e.rate_limited,
                    "Failed to load pull requests"
                );
                Some(e)
            }
        };

        module.complete_development_load(versions, error.clone());
        self.emitter.emit(AppEvent::development_versions_loaded(
            module.id(),
            error.clone(),
        ));
        error
    }

    async fn pull_request_records(
        &self,
        module: &Module,
    ) -> Result<Vec<PullRequestRecord>, ChannelError> {
        let (org, repo) = (module.organisation(), module.repository());
        if let Some(records) = self.cache.read(org, repo, CacheKind::Pulls).await {
            tracing::debug!(target: "modpkg.versions", org, repo, "Using cached pull requests");
            return Ok(records);
        }

        let records = self.source.fetch_pull_requests(org, repo).await?;
        self.cache.write(org, repo, CacheKind::Pulls, &records).await;
        Ok(records)
    }

    /// Resolve a branch package's commit SHA in the background.
    fn spawn_commit_lookup(&self, package: &Package) {
        let resolver = self.clone();
        let package = package.clone();
        tokio::spawn(async move {
            resolver.resolve_commit_sha(&package).await;
        });
    }

    /// Resolve the head commit of a branch or pull request package.
    ///
    /// Returns the already known SHA without a request. Failure leaves the SHA
    /// unset, which disables artifact caching for the package. The SHA slot is
    /// shared between clones, so a concurrent lookup is harmless.
    pub async fn resolve_commit_sha(&self, package: &Package) -> Option<String> {
        if let Some(sha) = package.commit_sha() {
            return Some(sha.to_string());
        }

        match self
            .source
            .fetch_latest_commit(
                package.organisation(),
                package.repository(),
                package.branch_name(),
            )
            .await
        {
            Ok(sha) => {
                tracing::debug!(
                    target: "modpkg.versions",
                    branch = %package.branch_name(),
                    sha = %sha,
                    "Resolved branch head"
                );
                package.set_commit_sha(sha);
            }
            Err(e) => {
                tracing::warn!(
                    target: "modpkg.versions",
                    branch = %package.branch_name(),
                    error = %e,
                    "Could not resolve branch head, artifact caching disabled"
                );
            }
        }
        package.commit_sha().map(str::to_string)
    }
}
