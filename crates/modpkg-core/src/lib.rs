#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod acquire;
pub mod cache;
pub mod config;
pub mod domain;
pub mod events;
pub mod operation;
pub mod paths;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use acquire::{AcquireError, ArtifactSlot, PackageArtifacts, SlotPaths};
pub use cache::{CacheError, CacheKind, METADATA_CACHE_TTL, MetadataCache};
pub use config::{ConfigError, ModuleConfig, ModulesConfig};
pub use domain::{
    Asset, AssetKind, ChannelError, ChannelState, Module, Package, PackageKind,
    RATE_LIMIT_REMEDIATION,
};
pub use events::AppEvent;
pub use operation::{OperationError, OperationKind, OperationOptions, OperationRequest};
pub use paths::{CACHE_DIR_ENV, PathError, cache_root, ensure_directory};
pub use ports::{
    AppEventEmitter, ChannelEmitter, DatabaseConnection, MigrationEngine, MigrationFeedback,
    NoopEmitter, RemoteError, RemoteResult, RemoteVersionSource, SharedConnection,
    is_rate_limit_message,
};
pub use services::{LoadOutcome, VersionResolver};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
