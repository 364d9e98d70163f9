//! Port definitions (trait abstractions) for external systems.
//!
//! Core defines the interfaces; adapters in other crates (or the host
//! application) implement them.
//!
//! # Design Rules
//!
//! - No adapter-specific types (reqwest, zip, database drivers) in signatures
//! - Async ports use `async-trait`; the migration engine is blocking
//! - Adapter errors are mapped into the port error types at the boundary

pub mod event_emitter;
pub mod migration;
pub mod remote;

pub use event_emitter::{AppEventEmitter, ChannelEmitter, NoopEmitter};
pub use migration::{
    DatabaseConnection, MigrationEngine, MigrationFeedback, Parameters, SharedConnection,
};
pub use remote::{
    HeadRepository, PullRequestHead, PullRequestRecord, ReleaseAssetRecord, ReleaseRecord,
    RemoteError, RemoteResult, RemoteVersionSource, RepositoryOwner, is_rate_limit_message,
};
