//! End-to-end acquisition through the public API.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use modpkg_acquire::{AcquisitionTask, ArtifactFetcher, ChunkStream};
use modpkg_core::ports::ReleaseRecord;
use modpkg_core::{AcquireError, NoopEmitter, Package};

/// Serves one archive for any URL and counts requests.
struct StaticFetcher {
    body: Bytes,
    requests: AtomicUsize,
}

#[async_trait]
impl ArtifactFetcher for StaticFetcher {
    async fn content_length(&self, _url: &str) -> Result<Option<u64>, AcquireError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.body.len() as u64))
    }

    async fn fetch(&self, _url: &str) -> Result<ChunkStream, AcquireError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let body = self.body.clone();
        Ok(futures_util::stream::once(async move { Ok(body) }).boxed())
    }
}

fn module_snapshot() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.add_directory("tww-2.1.0/", options).unwrap();
    writer
        .start_file("tww-2.1.0/datamodel/changelogs/0001/init.sql", options)
        .unwrap();
    writer.write_all(b"create schema tww_od;\n").unwrap();
    writer.finish().unwrap().into_inner()
}

fn release() -> Package {
    Package::from_release(
        "teksi",
        "wastewater",
        &ReleaseRecord {
            tag_name: "v2.1.0".to_string(),
            name: Some("2.1.0".to_string()),
            created_at: None,
            prerelease: false,
            html_url: "https://github.com/teksi/wastewater/releases/tag/v2.1.0".to_string(),
            assets: vec![],
        },
    )
}

#[tokio::test]
async fn repeated_release_acquisition_uses_cache() {
    let cache = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(StaticFetcher {
        body: Bytes::from(module_snapshot()),
        requests: AtomicUsize::new(0),
    });
    let task = AcquisitionTask::new(fetcher.clone(), Box::new(NoopEmitter::new()), cache.path());

    task.start_from_package(release()).await;
    task.wait().await;
    assert_eq!(task.last_error(), None);
    let after_first = fetcher.requests.load(Ordering::SeqCst);
    assert_eq!(after_first, 2);

    let source = task.artifacts().source_dir().unwrap().to_path_buf();
    assert_eq!(source, cache.path().join("pkgs/teksi/wastewater/v2.1.0/src"));
    assert!(source.join("datamodel/changelogs/0001/init.sql").is_file());

    task.start_from_package(release()).await;
    task.wait().await;
    assert_eq!(task.last_error(), None);
    assert_eq!(fetcher.requests.load(Ordering::SeqCst), after_first);
    assert_eq!(task.artifacts().source_dir(), Some(source.as_path()));
}
