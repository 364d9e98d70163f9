#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod archive;
mod fetcher;
mod paths;
mod progress;
mod task;
mod worker;

// ============================================================================
// Public API
// ============================================================================

pub use archive::{ExtractOutcome, MIN_ARCHIVE_SIZE, extract_archive, is_cached_and_valid};
pub use fetcher::{ArtifactFetcher, ChunkStream, ReqwestFetcher};
pub use paths::{ArtifactKey, PackageDestination, sanitize_package_name};
pub use task::AcquisitionTask;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
