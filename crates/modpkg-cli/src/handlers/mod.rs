//! Command handlers.

pub mod fetch;
pub mod modules;
pub mod versions;
