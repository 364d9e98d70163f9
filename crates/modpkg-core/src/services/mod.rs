//! Application services built on the core ports.

mod version_resolver;

pub use version_resolver::{LoadOutcome, VersionResolver};
