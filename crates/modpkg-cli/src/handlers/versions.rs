//! `modpkg versions <module> [--dev]`

use std::sync::Arc;

use modpkg_core::{LoadOutcome, Module, VersionResolver};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_version_line;

pub async fn execute(ctx: &CliContext, module_id: &str, dev: bool) -> Result<(), CliError> {
    let module = ctx.module(module_id)?;
    let resolver = ctx.quiet_resolver();

    if dev {
        load_development(&resolver, &module).await?;
        let versions = module.development_versions();
        if versions.is_empty() {
            println!("No development versions for {}.", module.display_name());
        }
        for package in &versions {
            println!("{}", format_version_line(package, false));
        }
    } else {
        load_releases(&resolver, &module).await?;
        let latest = module.latest_version();
        let versions = module.versions();
        if versions.is_empty() {
            println!("No releases for {}.", module.display_name());
        }
        for package in &versions {
            let is_latest = latest.as_ref() == Some(package);
            println!("{}", format_version_line(package, is_latest));
        }
    }
    Ok(())
}

pub(crate) async fn load_releases(
    resolver: &VersionResolver,
    module: &Arc<Module>,
) -> Result<(), CliError> {
    match resolver.load_versions(module).await {
        LoadOutcome::Completed { error: Some(error) } => Err(CliError::Versions(error)),
        LoadOutcome::Completed { error: None } | LoadOutcome::AlreadyLoading => Ok(()),
    }
}

/// A pull request failure keeps the branch and prereleases already listed,
/// so it is only logged.
pub(crate) async fn load_development(
    resolver: &VersionResolver,
    module: &Arc<Module>,
) -> Result<(), CliError> {
    match resolver.load_development_versions(module).await {
        LoadOutcome::Completed { error: Some(error) } => {
            if module.development_versions().is_empty() || error.rate_limited {
                return Err(CliError::Versions(error));
            }
            tracing::warn!(error = %error, "Development versions are incomplete");
            eprintln!("warning: {}", error.user_message());
            Ok(())
        }
        LoadOutcome::Completed { error: None } | LoadOutcome::AlreadyLoading => Ok(()),
    }
}
