//! Artifact fetching port and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use modpkg_core::AcquireError;

/// Stream of body chunks of one download.
pub type ChunkStream = BoxStream<'static, Result<Bytes, AcquireError>>;

/// Fetches archives over the network.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Declared size of the resource (metadata-only request).
    ///
    /// `Ok(None)` when the server does not declare one.
    async fn content_length(&self, url: &str) -> Result<Option<u64>, AcquireError>;

    /// Start a streamed download.
    async fn fetch(&self, url: &str) -> Result<ChunkStream, AcquireError>;
}

/// Limit for a whole metadata-only request.
pub const HEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Limit for a download's response headers to arrive.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Production fetcher using reqwest.
pub struct ReqwestFetcher {
    client: reqwest::Client,
    head_timeout: Duration,
    response_timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str) -> Result<Self, AcquireError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AcquireError::network(e.to_string()))?;
        Ok(Self {
            client,
            head_timeout: HEAD_TIMEOUT,
            response_timeout: RESPONSE_TIMEOUT,
        })
    }

    /// Override the request limits.
    #[must_use]
    pub const fn with_timeouts(mut self, head: Duration, response: Duration) -> Self {
        self.head_timeout = head;
        self.response_timeout = response;
        self
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> AcquireError {
    match err.status() {
        Some(status) => AcquireError::network_with_status(err.to_string(), status.as_u16()),
        None => AcquireError::network(err.to_string()),
    }
}

#[async_trait]
impl ArtifactFetcher for ReqwestFetcher {
    async fn content_length(&self, url: &str) -> Result<Option<u64>, AcquireError> {
        let response = self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;
        if !response.status().is_success() {
            return Err(AcquireError::network_with_status(
                format!("HEAD {url} returned HTTP {}", response.status()),
                response.status().as_u16(),
            ));
        }
        // Read the header itself: the body of a HEAD response is always empty.
        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok()))
    }

    async fn fetch(&self, url: &str) -> Result<ChunkStream, AcquireError> {
        // The body stream itself is unbounded: archives can be large.
        let response = tokio::time::timeout(self.response_timeout, self.client.get(url).send())
            .await
            .map_err(|_| {
                AcquireError::network(format!(
                    "No response from {url} within {}s",
                    self.response_timeout.as_secs()
                ))
            })?
            .map_err(|e| map_reqwest_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::network_with_status(
                format!("Download failed: HTTP {status} for {url}"),
                status.as_u16(),
            ));
        }
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| map_reqwest_error(&e)))
            .boxed())
    }
}


// ============================================================================
// Fake Fetcher for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct Resource {
        body: Bytes,
        declared_length: bool,
        chunk_size: usize,
        stall_after: Option<usize>,
    }

    /// In-memory fetcher that counts requests.
    #[derive(Clone, Default)]
    pub struct FakeFetcher {
        resources: HashMap<String, Resource>,
        heads: Arc<AtomicUsize>,
        gets: Arc<AtomicUsize>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `body` at `url` in 16 KiB chunks with a declared length.
        pub fn with_resource(mut self, url: &str, body: Vec<u8>) -> Self {
            self.resources.insert(
                url.to_string(),
                Resource {
                    body: Bytes::from(body),
                    declared_length: true,
                    chunk_size: 16 * 1024,
                    stall_after: None,
                },
            );
            self
        }

        /// Serve `body` without declaring its length.
        pub fn with_undeclared_resource(mut self, url: &str, body: Vec<u8>) -> Self {
            self = self.with_resource(url, body);
            if let Some(resource) = self.resources.get_mut(url) {
                resource.declared_length = false;
            }
            self
        }

        /// Serve `chunks` chunks of `body` at `url`, then hang forever.
        pub fn with_stalling_resource(mut self, url: &str, body: Vec<u8>, chunks: usize) -> Self {
            self = self.with_resource(url, body);
            if let Some(resource) = self.resources.get_mut(url) {
                resource.stall_after = Some(chunks);
            }
            self
        }

        pub fn head_count(&self) -> usize {
            self.heads.load(Ordering::SeqCst)
        }

        pub fn get_count(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub fn request_count(&self) -> usize {
            self.head_count() + self.get_count()
        }

        fn resource(&self, url: &str) -> Result<&Resource, AcquireError> {
            self.resources
                .get(url)
                .ok_or_else(|| AcquireError::network_with_status(format!("404 for {url}"), 404))
        }
    }

    #[async_trait]
    impl ArtifactFetcher for FakeFetcher {
        async fn content_length(&self, url: &str) -> Result<Option<u64>, AcquireError> {
            self.heads.fetch_add(1, Ordering::SeqCst);
            let resource = self.resource(url)?;
            Ok(resource
                .declared_length
                .then_some(resource.body.len() as u64))
        }

        async fn fetch(&self, url: &str) -> Result<ChunkStream, AcquireError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let resource = self.resource(url)?.clone();
            let chunks: Vec<Result<Bytes, AcquireError>> = resource
                .body
                .chunks(resource.chunk_size)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();

            match resource.stall_after {
                Some(n) => {
                    let head = futures_util::stream::iter(chunks.into_iter().take(n));
                    Ok(head.chain(futures_util::stream::pending()).boxed())
                }
                None => Ok(futures_util::stream::iter(chunks).boxed()),
            }
        }
    }
}
