//! Domain types for modules and their installable versions.
//!
//! These types are pure data with no infrastructure dependencies.

mod channel;
mod module;
mod package;

pub use channel::{ChannelError, ChannelState, RATE_LIMIT_REMEDIATION};
pub use module::{Module, ReleaseListing};
pub use package::{Asset, AssetKind, Package, PackageKind};
