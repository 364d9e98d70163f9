//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are instantiated:
//! - GitHub client (via modpkg-github)
//! - Metadata cache and version resolver (via modpkg-core)
//! - Artifact fetcher (via modpkg-acquire)

use std::path::PathBuf;
use std::sync::Arc;

use modpkg_acquire::ReqwestFetcher;
use modpkg_core::{
    AppEventEmitter, MetadataCache, Module, ModulesConfig, NoopEmitter, RemoteVersionSource,
    VersionResolver, cache_root, ensure_directory,
};
use modpkg_github::{DefaultGithubClient, GithubClientConfig};

use crate::error::CliError;
use crate::parser::Cli;

const USER_AGENT: &str = concat!("modpkg/", env!("CARGO_PKG_VERSION"));

/// Log filter used when `RUST_LOG` is unset.
pub const fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Modules configuration file.
    pub modules_path: PathBuf,
    /// Cache root override.
    pub cache_dir: Option<PathBuf>,
    /// GitHub token.
    pub token: Option<String>,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            modules_path: cli.config.clone(),
            cache_dir: cli.cache_dir.clone(),
            token: cli.token.clone(),
        }
    }
}

/// Fully composed context for command handlers.
pub struct CliContext {
    pub modules: ModulesConfig,
    pub cache_root: PathBuf,
    pub source: Arc<dyn RemoteVersionSource>,
}

impl CliContext {
    /// Build the in-memory module for a configured id.
    pub fn module(&self, id: &str) -> Result<Arc<Module>, CliError> {
        self.modules
            .find(id)
            .map(|config| Arc::new(Module::from_config(config)))
            .ok_or_else(|| {
                CliError::Arguments(format!(
                    "unknown module '{id}' (see `modpkg modules` for configured ids)"
                ))
            })
    }

    /// Version resolver reporting to `emitter`.
    pub fn resolver(&self, emitter: Arc<dyn AppEventEmitter>) -> VersionResolver {
        VersionResolver::new(
            Arc::clone(&self.source),
            MetadataCache::new(&self.cache_root),
            emitter,
        )
    }

    /// Version resolver without event delivery.
    pub fn quiet_resolver(&self) -> VersionResolver {
        self.resolver(Arc::new(NoopEmitter::new()))
    }

    pub fn fetcher(&self) -> Result<ReqwestFetcher, CliError> {
        ReqwestFetcher::new(USER_AGENT).map_err(CliError::from)
    }
}

/// Compose the CLI context.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let modules = ModulesConfig::load(&config.modules_path)?;

    let cache_root = match config.cache_dir {
        Some(dir) => dir,
        None => cache_root()?,
    };
    ensure_directory(&cache_root)?;

    let github = GithubClientConfig::new()
        .with_user_agent(USER_AGENT)
        .with_optional_token(config.token);
    let source = DefaultGithubClient::new(&github)
        .map_err(|e| CliError::Config(format!("GitHub client: {e}")))?;

    tracing::debug!(
        config = %config.modules_path.display(),
        cache = %cache_root.display(),
        modules = modules.modules.len(),
        "CLI context ready"
    );

    Ok(CliContext {
        modules,
        cache_root,
        source: Arc::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULES: &str = r#"
[[modules]]
name = "TEKSI Wastewater"
id = "tww"
organisation = "teksi"
repository = "wastewater"
"#;

    fn config_in(dir: &std::path::Path) -> CliConfig {
        let path = dir.join("modules.toml");
        std::fs::write(&path, MODULES).unwrap();
        CliConfig {
            modules_path: path,
            cache_dir: Some(dir.join("cache")),
            token: None,
        }
    }

    #[test]
    fn test_default_log_filter() {
        assert_eq!(default_log_filter(false), "warn");
        assert_eq!(default_log_filter(true), "debug");
    }

    #[test]
    fn test_bootstrap_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(config_in(dir.path())).unwrap();
        assert!(ctx.cache_root.is_dir());
        assert_eq!(ctx.module("tww").unwrap().repository(), "wastewater");
    }

    #[test]
    fn test_unknown_module_is_an_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(config_in(dir.path())).unwrap();
        assert!(matches!(ctx.module("qwat"), Err(CliError::Arguments(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            modules_path: dir.path().join("absent.toml"),
            cache_dir: Some(dir.path().to_path_buf()),
            token: None,
        };
        let err = bootstrap(config).err().unwrap();
        assert_eq!(err.exit_code(), 78);
    }
}
