//! Terminal output for command handlers.

mod progress;
mod versions;

pub use progress::FetchProgress;
pub use versions::{format_module_line, format_version_line};
