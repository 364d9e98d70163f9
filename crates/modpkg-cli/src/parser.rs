//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Browse and fetch versioned database modules published on GitHub.
#[derive(Debug, Parser)]
#[command(name = "modpkg")]
#[command(about = "Browse and fetch versioned database modules")]
#[command(version)]
pub struct Cli {
    /// Modules configuration file
    #[arg(long, global = true, env = "MODPKG_CONFIG", default_value = "modules.toml")]
    pub config: PathBuf,

    /// Override the cache directory for this invocation
    #[arg(long = "cache-dir", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// GitHub token (raises the API rate limit)
    #[arg(long, global = true, env = "MODPKG_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
