//! Acquisition worker pipeline.
//!
//! The worker operates on a value-type [`AcquisitionJob`] and cloned
//! dependencies; it never touches the owning task's locks except the shared
//! artifact slot it fills in.
//!
//! # Pipeline
//!
//! 1. Prepare the package directory and drop stale single-use artifacts
//! 2. Plan each slot (source, project, plugin): local, cached or remote
//! 3. Size the remote slots with metadata-only requests
//! 4. Download (or reuse) and extract each slot in order
//!
//! Cancellation is observed via `tokio::select!` around every network read
//! and before every chunk is accounted.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use modpkg_core::{
    AcquireError, AppEvent, AppEventEmitter, ArtifactSlot, Package, PackageArtifacts, SlotPaths,
};

use crate::archive::{ExtractOutcome, extract_archive, is_cached_and_valid};
use crate::fetcher::ArtifactFetcher;
use crate::paths::PackageDestination;
use crate::progress::ProgressTracker;

/// Largest slice of a network chunk accounted at once.
const CHUNK_SIZE: usize = 256 * 1024;

/// Dependencies for the acquisition worker.
pub struct WorkerDeps {
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub emitter: Box<dyn AppEventEmitter>,
    /// Output slot shared with the owning task.
    pub artifacts: Arc<Mutex<PackageArtifacts>>,
}

impl Clone for WorkerDeps {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            emitter: self.emitter.clone_box(),
            artifacts: Arc::clone(&self.artifacts),
        }
    }
}

/// One acquisition run.
pub struct AcquisitionJob {
    pub package: Package,
    pub destination: PackageDestination,
    /// User-supplied source archive; skips the source download.
    pub local_archive: Option<PathBuf>,
    pub cancel: CancellationToken,
}

/// Where a slot's archive comes from.
#[derive(Debug)]
enum SlotSource {
    /// Supplied by the caller.
    Local(PathBuf),
    /// Already in the artifact cache.
    Cached(PathBuf),
    /// Needs downloading.
    Remote { url: String, archive: PathBuf },
}

impl SlotSource {
    fn archive(&self) -> &Path {
        match self {
            Self::Local(path) | Self::Cached(path) => path,
            Self::Remote { archive, .. } => archive,
        }
    }
}

/// Forwards events until the run is cancelled.
struct UntilCancelled {
    inner: Box<dyn AppEventEmitter>,
    cancel: CancellationToken,
}

impl AppEventEmitter for UntilCancelled {
    fn emit(&self, event: AppEvent) {
        if !self.cancel.is_cancelled() {
            self.inner.emit(event);
        }
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(Self {
            inner: self.inner.clone_box(),
            cancel: self.cancel.clone(),
        })
    }
}

/// Run an acquisition job to completion.
///
/// Artifact paths are written into `deps.artifacts` as each slot completes
/// and are left in place when a later slot fails.
///
/// # Errors
///
/// Returns `AcquireError::Cancelled` when `job.cancel` fires, and the first
/// network, I/O or archive failure otherwise.
pub async fn run_job(job: AcquisitionJob, deps: &WorkerDeps) -> Result<(), AcquireError> {
    ensure_not_cancelled(&job.cancel)?;

    // Steps 1-2: Prepare the package directory and plan every slot
    let plan = prepare(&job).await?;

    // Step 3: Pre-flight sizing
    let expected_total = if plan
        .iter()
        .any(|(_, source)| matches!(source, SlotSource::Remote { .. }))
    {
        expected_total(&plan, deps.fetcher.as_ref(), &job.cancel).await?
    } else {
        0
    };
    tracing::debug!(
        target: "modpkg.acquire",
        package = %job.package.name(),
        expected_total,
        slots = plan.len(),
        "Acquisition planned"
    );

    let mut tracker = ProgressTracker::new(
        expected_total,
        Box::new(UntilCancelled {
            inner: deps.emitter.clone_box(),
            cancel: job.cancel.clone(),
        }),
    );

    // Step 4: Fetch and extract in slot order
    for (slot, source) in plan {
        ensure_not_cancelled(&job.cancel)?;

        match &source {
            SlotSource::Remote { url, archive } => {
                download(deps.fetcher.as_ref(), url, archive, &job.cancel, &mut tracker).await?;
            }
            SlotSource::Cached(archive) => {
                tracing::debug!(target: "modpkg.acquire", archive = %archive.display(), "Reusing cached archive");
                tracker.mark_reused();
            }
            SlotSource::Local(_) => {}
        }

        let archive = source.archive().to_path_buf();
        record(&deps.artifacts, slot, |paths| paths.archive = Some(archive.clone()));

        ensure_not_cancelled(&job.cancel)?;
        let target = job.destination.extract_dir(slot);
        extract(&archive, &target, !matches!(source, SlotSource::Local(_))).await?;
        record(&deps.artifacts, slot, |paths| paths.dir = Some(target.clone()));

        tracing::info!(
            target: "modpkg.acquire",
            slot = slot.archive_stem(),
            dir = %target.display(),
            "Artifact ready"
        );
    }

    Ok(())
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), AcquireError> {
    if cancel.is_cancelled() {
        Err(AcquireError::Cancelled)
    } else {
        Ok(())
    }
}

fn record(
    artifacts: &Mutex<PackageArtifacts>,
    slot: ArtifactSlot,
    update: impl FnOnce(&mut SlotPaths),
) {
    let mut guard = artifacts.lock().unwrap_or_else(PoisonError::into_inner);
    update(guard.slot_mut(slot));
}

/// Prepare the package directory and plan the slots on the blocking pool.
///
/// Probing the cache opens and parses every candidate archive.
async fn prepare(job: &AcquisitionJob) -> Result<Vec<(ArtifactSlot, SlotSource)>, AcquireError> {
    let package = job.package.clone();
    let destination = job.destination.clone();
    let local_archive = job.local_archive.clone();
    tokio::task::spawn_blocking(move || {
        destination.ensure_dir()?;
        destination.remove_stale_unresolved();
        plan_slots(&package, &destination, local_archive.as_deref())
    })
    .await
    .map_err(|e| AcquireError::other(format!("Planning task failed: {e}")))?
}

fn plan_slots(
    package: &Package,
    destination: &PackageDestination,
    local_archive: Option<&Path>,
) -> Result<Vec<(ArtifactSlot, SlotSource)>, AcquireError> {
    let reusable = destination.key().is_reusable();
    let remote_or_cached = |slot: ArtifactSlot, url: &str| {
        let archive = destination.archive_path(slot);
        if reusable && is_cached_and_valid(&archive) {
            SlotSource::Cached(archive)
        } else {
            SlotSource::Remote {
                url: url.to_string(),
                archive,
            }
        }
    };

    let mut plan = Vec::with_capacity(ArtifactSlot::ALL.len());

    let source = match (local_archive, package.download_url()) {
        (Some(path), _) => SlotSource::Local(path.to_path_buf()),
        (None, Some(url)) => remote_or_cached(ArtifactSlot::Source, url),
        (None, None) => {
            return Err(AcquireError::MissingSource {
                name: package.name().to_string(),
            });
        }
    };
    plan.push((ArtifactSlot::Source, source));

    if let Some(asset) = package.asset_project() {
        plan.push((
            ArtifactSlot::Project,
            remote_or_cached(ArtifactSlot::Project, &asset.download_url),
        ));
    }
    if let Some(asset) = package.asset_plugin() {
        plan.push((
            ArtifactSlot::Plugin,
            remote_or_cached(ArtifactSlot::Plugin, &asset.download_url),
        ));
    }

    Ok(plan)
}

/// Sum the declared sizes of every slot that needs downloading.
///
/// Slots whose size cannot be determined are left out of the total.
async fn expected_total(
    plan: &[(ArtifactSlot, SlotSource)],
    fetcher: &dyn ArtifactFetcher,
    cancel: &CancellationToken,
) -> Result<u64, AcquireError> {
    let mut total = 0u64;
    for (slot, source) in plan {
        let SlotSource::Remote { url, .. } = source else {
            continue;
        };
        let length = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AcquireError::Cancelled),
            length = fetcher.content_length(url) => length,
        };
        match length {
            Ok(Some(len)) => total = total.saturating_add(len),
            Ok(None) => {
                tracing::debug!(target: "modpkg.acquire", slot = slot.archive_stem(), "No declared size");
            }
            Err(e) => {
                tracing::debug!(target: "modpkg.acquire", slot = slot.archive_stem(), error = %e, "Sizing request failed");
            }
        }
    }
    Ok(total)
}

fn part_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Download `url` to `archive` via a `.part` file.
async fn download(
    fetcher: &dyn ArtifactFetcher,
    url: &str,
    archive: &Path,
    cancel: &CancellationToken,
    tracker: &mut ProgressTracker,
) -> Result<(), AcquireError> {
    let part = part_path(archive);
    tracing::debug!(target: "modpkg.acquire", url, "Downloading");

    match stream_to_file(fetcher, url, &part, cancel, tracker).await {
        Ok(()) => {
            tokio::fs::rename(&part, archive).await?;
            Ok(())
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(target: "modpkg.acquire", path = %part.display(), error = %rm, "Failed to remove partial download");
                }
            }
            Err(e)
        }
    }
}

async fn stream_to_file(
    fetcher: &dyn ArtifactFetcher,
    url: &str,
    part: &Path,
    cancel: &CancellationToken,
    tracker: &mut ProgressTracker,
) -> Result<(), AcquireError> {
    let mut stream = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(AcquireError::Cancelled),
        stream = fetcher.fetch(url) => stream?,
    };
    let mut file = tokio::fs::File::create(part).await?;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AcquireError::Cancelled),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;

        for piece in chunk.chunks(CHUNK_SIZE) {
            ensure_not_cancelled(cancel)?;
            file.write_all(piece).await?;
            tracker.advance(piece.len() as u64);
        }
    }

    file.flush().await?;
    tracker.finish();
    Ok(())
}

/// Extract on the blocking pool.
///
/// A cache-owned archive that fails to extract is deleted so the next run
/// downloads it again.
async fn extract(archive: &Path, target: &Path, owned: bool) -> Result<(), AcquireError> {
    let (a, t) = (archive.to_path_buf(), target.to_path_buf());
    let result = tokio::task::spawn_blocking(move || extract_archive(&a, &t))
        .await
        .map_err(|e| AcquireError::other(format!("Extraction task failed: {e}")))?;

    match result {
        Ok(ExtractOutcome::Extracted) => Ok(()),
        Ok(ExtractOutcome::AlreadyExtracted) => {
            tracing::debug!(target: "modpkg.acquire", dir = %target.display(), "Already extracted");
            Ok(())
        }
        Err(e) => {
            if owned {
                if let Err(rm) = std::fs::remove_file(archive) {
                    tracing::warn!(target: "modpkg.acquire", path = %archive.display(), error = %rm, "Failed to remove corrupt archive");
                }
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/cache/pkgs/o/r/v1/source.zip")),
            PathBuf::from("/cache/pkgs/o/r/v1/source.zip.part")
        );
    }

    #[test]
    fn plan_requires_a_source() {
        let package = Package::from_archive("o", "r", "upload");
        let destination = PackageDestination::plan(Path::new("/nonexistent"), &package);
        assert!(matches!(
            plan_slots(&package, &destination, None),
            Err(AcquireError::MissingSource { name }) if name == "upload"
        ));
    }

    #[test]
    fn local_archive_is_never_remote() {
        let package = Package::from_archive("o", "r", "upload");
        let destination = PackageDestination::plan(Path::new("/nonexistent"), &package);
        let plan =
            plan_slots(&package, &destination, Some(Path::new("/tmp/upload.zip"))).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan[0].1, SlotSource::Local(p) if p == Path::new("/tmp/upload.zip")));
    }

    #[tokio::test]
    async fn prepare_reuses_valid_cached_archive() {
        let cache = tempfile::tempdir().unwrap();
        let package = Package::branch("o", "r", "main");
        package.set_commit_sha("0123456789abcdef");
        let destination = PackageDestination::plan(cache.path(), &package);
        destination.ensure_dir().unwrap();
        let archive = destination.archive_path(ArtifactSlot::Source);
        std::fs::write(
            &archive,
            crate::archive::fixtures::snapshot_zip("r-main", &[("README.md", b"# r\n")]),
        )
        .unwrap();

        let job = AcquisitionJob {
            package,
            destination,
            local_archive: None,
            cancel: CancellationToken::new(),
        };
        let plan = prepare(&job).await.unwrap();

        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan[0].1, SlotSource::Cached(p) if *p == archive));
    }
}
