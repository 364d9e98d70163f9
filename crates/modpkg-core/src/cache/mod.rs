//! On-disk cache of remote version listings.

mod metadata;

pub use metadata::{CacheError, CacheKind, METADATA_CACHE_TTL, MetadataCache};
