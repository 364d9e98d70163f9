//! Package acquisition domain types.
//!
//! The acquisition workflow itself lives in `modpkg-acquire`; core owns the
//! error taxonomy and the artifact slots so that events and callers can refer
//! to them without depending on the adapter.

mod artifacts;
mod errors;

pub use artifacts::{ArtifactSlot, PackageArtifacts, SlotPaths};
pub use errors::AcquireError;
