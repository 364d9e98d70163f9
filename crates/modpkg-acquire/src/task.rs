//! Single-flight acquisition task.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use modpkg_core::{AcquireError, AppEvent, AppEventEmitter, Package, PackageArtifacts};

use crate::fetcher::ArtifactFetcher;
use crate::paths::PackageDestination;
use crate::worker::{AcquisitionJob, WorkerDeps, run_job};

#[derive(Debug, Default)]
struct RunState {
    last_error: Option<AcquireError>,
    cancel: Option<CancellationToken>,
    running: bool,
}

/// Downloads, caches and extracts one package at a time.
///
/// Starting a run while another is in flight cancels the previous run and
/// waits for it to stop before the new one begins. Runs are never queued.
///
/// Every run ends with exactly one `PackagingFinished` event; its error (if
/// any) is also kept as [`last_error`](Self::last_error). Paths in
/// [`artifacts`](Self::artifacts) are only trustworthy when there is no error.
pub struct AcquisitionTask {
    fetcher: Arc<dyn ArtifactFetcher>,
    emitter: Box<dyn AppEventEmitter>,
    cache_root: PathBuf,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    state: Arc<Mutex<RunState>>,
    artifacts: Arc<Mutex<PackageArtifacts>>,
}

impl AcquisitionTask {
    /// Create a task caching artifacts below `cache_root/pkgs`.
    pub fn new(
        fetcher: Arc<dyn ArtifactFetcher>,
        emitter: Box<dyn AppEventEmitter>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            emitter,
            cache_root: cache_root.into(),
            handle: tokio::sync::Mutex::new(None),
            state: Arc::new(Mutex::new(RunState::default())),
            artifacts: Arc::new(Mutex::new(PackageArtifacts::default())),
        }
    }

    /// Acquire `package` from the network (or the artifact cache).
    pub async fn start_from_package(&self, package: Package) {
        self.start(package, None).await;
    }

    /// Use a local archive as the package source instead of downloading it.
    ///
    /// Release assets of `package`, if any, are still fetched.
    pub async fn start_from_archive(&self, package: Package, archive: impl Into<PathBuf>) {
        self.start(package, Some(archive.into())).await;
    }

    async fn start(&self, package: Package, local_archive: Option<PathBuf>) {
        // Held for the whole start so concurrent starts serialize.
        let mut handle = self.handle.lock().await;

        if let Some(previous) = handle.take() {
            self.cancel();
            tracing::debug!(target: "modpkg.acquire", "Waiting for previous acquisition to stop");
            if let Err(e) = previous.await {
                tracing::warn!(target: "modpkg.acquire", error = %e, "Previous acquisition task failed");
            }
        }

        let cancel = CancellationToken::new();
        {
            let mut state = self.lock_state();
            state.last_error = None;
            state.cancel = Some(cancel.clone());
            state.running = true;
        }
        *self
            .artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = PackageArtifacts::default();

        let job = AcquisitionJob {
            destination: PackageDestination::plan(&self.cache_root, &package),
            package,
            local_archive,
            cancel,
        };
        let deps = WorkerDeps {
            fetcher: Arc::clone(&self.fetcher),
            emitter: self.emitter.clone_box(),
            artifacts: Arc::clone(&self.artifacts),
        };
        let state = Arc::clone(&self.state);

        tracing::info!(
            target: "modpkg.acquire",
            package = %job.package.name(),
            dir = %job.destination.dir().display(),
            "Starting acquisition"
        );

        *handle = Some(tokio::spawn(async move {
            let error = run_job(job, &deps).await.err();
            match &error {
                None => tracing::info!(target: "modpkg.acquire", "Acquisition complete"),
                Some(e) if e.is_cancelled() => {
                    tracing::info!(target: "modpkg.acquire", "Acquisition cancelled");
                }
                Some(e) => tracing::error!(target: "modpkg.acquire", error = %e, "Acquisition failed"),
            }
            {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.last_error.clone_from(&error);
                state.running = false;
                state.cancel = None;
            }
            deps.emitter.emit(AppEvent::packaging_finished(error));
        }));
    }

    /// Request cancellation of the in-flight run, if any.
    ///
    /// Returns immediately; use [`wait`](Self::wait) to observe the stop.
    pub fn cancel(&self) {
        if let Some(cancel) = &self.lock_state().cancel {
            cancel.cancel();
        }
    }

    /// Wait for the current run to finish.
    pub async fn wait(&self) {
        let previous = self.handle.lock().await.take();
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                tracing::warn!(target: "modpkg.acquire", error = %e, "Acquisition task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Error of the last completed run.
    pub fn last_error(&self) -> Option<AcquireError> {
        self.lock_state().last_error.clone()
    }

    /// Snapshot of the artifact paths filled in so far.
    pub fn artifacts(&self) -> PackageArtifacts {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AcquisitionTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
