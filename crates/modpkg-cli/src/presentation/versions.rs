//! One-line renderings of modules and packages.

use modpkg_core::{ModuleConfig, Package, PackageKind};

pub fn format_module_line(module: &ModuleConfig) -> String {
    let name = if module.experimental {
        format!("{} (experimental)", module.name)
    } else {
        module.name.clone()
    };
    format!(
        "{:<12} {:<32} {}/{}",
        module.id, name, module.organisation, module.repository
    )
}

/// `name  [kind]  date  sha  marker`
pub fn format_version_line(package: &Package, is_latest: bool) -> String {
    let kind = match package.kind() {
        PackageKind::Release if package.is_prerelease() => "prerelease",
        PackageKind::Release => "release",
        PackageKind::Branch => "branch",
        PackageKind::PullRequest => "pull request",
        PackageKind::FromArchive => "archive",
    };
    let date = package
        .created_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let sha = package
        .commit_sha()
        .map(|s| s.get(..8).unwrap_or(s))
        .unwrap_or_default();

    let mut line = format!(
        "{:<40} {:<12} {:<10} {:<8}",
        package.display_name(),
        kind,
        date,
        sha
    );
    if is_latest {
        line.push_str(" (latest)");
    }
    line.trim_end().to_string()
}
