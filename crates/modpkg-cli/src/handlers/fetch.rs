//! `modpkg fetch <module> <version> [--archive <zip>]`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use modpkg_acquire::AcquisitionTask;
use modpkg_core::{
    ChannelEmitter, Module, Package, PackageArtifacts, PackageKind, VersionResolver,
};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::versions::{load_development, load_releases};
use crate::presentation::FetchProgress;

/// Longest wait for a branch head before downloading it uncached.
const BRANCH_HEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve, download and extract one package.
///
/// With `archive`, `version` only names the package and nothing is looked
/// up remotely for the source.
pub async fn execute(
    ctx: &CliContext,
    module_id: &str,
    version: &str,
    archive: Option<PathBuf>,
) -> Result<(), CliError> {
    let module = ctx.module(module_id)?;

    let package = match &archive {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::Arguments(format!(
                    "archive not found: {}",
                    path.display()
                )));
            }
            Package::from_archive(module.organisation(), module.repository(), version)
        }
        None => resolve_package(ctx, &module, version).await?,
    };

    let artifacts = acquire(ctx, package, archive).await?;
    print_artifacts(&artifacts);
    Ok(())
}

/// Find `version` among releases, then development versions.
async fn resolve_package(
    ctx: &CliContext,
    module: &Arc<Module>,
    version: &str,
) -> Result<Package, CliError> {
    let resolver = ctx.quiet_resolver();

    load_releases(&resolver, module).await?;
    if let Some(package) = module.find_version(version) {
        return Ok(package);
    }

    load_development(&resolver, module).await?;
    let package = module.find_version(version).ok_or_else(|| {
        CliError::Arguments(format!(
            "unknown version '{version}' of {} (see `modpkg versions {} [--dev]`)",
            module.display_name(),
            module.id()
        ))
    })?;
    await_branch_head(&resolver, &package, BRANCH_HEAD_TIMEOUT).await;
    Ok(package)
}

/// Wait, bounded, for a branch package's head commit so its artifacts can be
/// cached under it.
async fn await_branch_head(resolver: &VersionResolver, package: &Package, limit: Duration) {
    if package.kind() != PackageKind::Branch || package.commit_sha().is_some() {
        return;
    }
    if tokio::time::timeout(limit, resolver.resolve_commit_sha(package))
        .await
        .is_err()
    {
        tracing::warn!(
            branch = %package.branch_name(),
            "Branch head lookup timed out, downloading without cache"
        );
    }
}

async fn acquire(
    ctx: &CliContext,
    package: Package,
    archive: Option<PathBuf>,
) -> Result<PackageArtifacts, CliError> {
    let (emitter, mut events) = ChannelEmitter::new();
    let task = Arc::new(AcquisitionTask::new(
        Arc::new(ctx.fetcher()?),
        Box::new(emitter),
        &ctx.cache_root,
    ));

    let renderer = tokio::spawn(async move {
        let mut progress = FetchProgress::new();
        while let Some(event) = events.recv().await {
            if progress.handle(&event) {
                break;
            }
        }
    });

    let watcher = {
        let task = Arc::clone(&task);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                task.cancel();
            }
        })
    };

    println!("Preparing {}", package.display_name());
    match archive {
        Some(path) => task.start_from_archive(package, path).await,
        None => task.start_from_package(package).await,
    }
    task.wait().await;
    watcher.abort();
    if let Err(e) = renderer.await {
        tracing::debug!(error = %e, "Progress renderer stopped");
    }

    // Cancellation maps to `CliError::Cancelled`.
    match task.last_error() {
        None => Ok(task.artifacts()),
        Some(err) => Err(CliError::from(err)),
    }
}

fn print_artifacts(artifacts: &PackageArtifacts) {
    let line = |label: &str, dir: Option<&Path>| {
        if let Some(dir) = dir {
            println!("{label:<8} {}", dir.display());
        }
    };
    line("source", artifacts.source.dir.as_deref());
    line("project", artifacts.project.dir.as_deref());
    line("plugin", artifacts.plugin.dir.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use modpkg_core::ports::{PullRequestRecord, ReleaseRecord};
    use modpkg_core::{MetadataCache, NoopEmitter, RemoteResult, RemoteVersionSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowHead {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteVersionSource for SlowHead {
        async fn fetch_releases(&self, _: &str, _: &str) -> RemoteResult<Vec<ReleaseRecord>> {
            Ok(vec![])
        }

        async fn fetch_pull_requests(
            &self,
            _: &str,
            _: &str,
        ) -> RemoteResult<Vec<PullRequestRecord>> {
            Ok(vec![])
        }

        async fn fetch_latest_commit(&self, _: &str, _: &str, _: &str) -> RemoteResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok("89abcdef01234567".to_string())
        }
    }

    fn resolver(source: &Arc<SlowHead>, cache_root: &Path) -> VersionResolver {
        VersionResolver::new(
            Arc::clone(source) as Arc<dyn RemoteVersionSource>,
            MetadataCache::new(cache_root),
            Arc::new(NoopEmitter::new()),
        )
    }

    #[tokio::test]
    async fn test_branch_head_is_awaited() {
        let temp = tempfile::tempdir().unwrap();
        let source = Arc::new(SlowHead {
            delay: Duration::from_millis(150),
            calls: AtomicUsize::new(0),
        });
        let package = Package::branch("teksi", "wastewater", "main");

        await_branch_head(&resolver(&source, temp.path()), &package, Duration::from_secs(5)).await;

        assert_eq!(package.commit_sha(), Some("89abcdef01234567"));
    }

    #[tokio::test]
    async fn test_branch_head_wait_is_bounded() {
        let temp = tempfile::tempdir().unwrap();
        let source = Arc::new(SlowHead {
            delay: Duration::from_secs(30),
            calls: AtomicUsize::new(0),
        });
        let package = Package::branch("teksi", "wastewater", "main");

        await_branch_head(&resolver(&source, temp.path()), &package, Duration::from_millis(50))
            .await;

        assert!(package.commit_sha().is_none());
    }

    #[tokio::test]
    async fn test_non_branch_packages_skip_head_lookup() {
        let temp = tempfile::tempdir().unwrap();
        let source = Arc::new(SlowHead {
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        let package = Package::from_archive("teksi", "wastewater", "local");

        await_branch_head(&resolver(&source, temp.path()), &package, Duration::from_secs(5)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
