//! Remote version source port.
//!
//! Core owns the trait, the record DTOs and the error type. The GitHub
//! adapter lives in `modpkg-github`.

mod client;
mod error;
mod types;

#[cfg(test)]
pub use client::MockRemoteVersionSource;
pub use client::RemoteVersionSource;
pub use error::{RemoteError, RemoteResult, is_rate_limit_message};
pub use types::{
    HeadRepository, PullRequestHead, PullRequestRecord, ReleaseAssetRecord, ReleaseRecord,
    RepositoryOwner,
};
