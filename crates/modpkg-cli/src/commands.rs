//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List configured modules
    Modules {
        /// Include experimental modules
        #[arg(long)]
        experimental: bool,
    },

    /// List available versions of a module
    Versions {
        /// Module id (see `modpkg modules`)
        module: String,
        /// List branches, prereleases and pull requests instead of releases
        #[arg(long)]
        dev: bool,
    },

    /// Download and extract a module version into the cache
    Fetch {
        /// Module id
        module: String,
        /// Release name or tag, branch name, or pull request title
        version: String,
        /// Extract this local zip archive instead of downloading the source
        #[arg(long)]
        archive: Option<PathBuf>,
    },
}
