//! Modules built from a configuration file behave like their config says.

#![allow(clippy::unwrap_used)]

use modpkg_core::ports::ReleaseRecord;
use modpkg_core::{Module, ModulesConfig};

const CONFIG: &str = r#"
[[modules]]
name = "TEKSI Wastewater"
id = "tww"
organisation = "teksi"
repository = "wastewater"
exclude_releases = "^v1\\."

[[modules]]
name = "Sandbox"
id = "sandbox"
organisation = "opengisch"
repository = "sandbox"
experimental = true
"#;

fn release(tag: &str, created_at: &str) -> ReleaseRecord {
    serde_json::from_value(serde_json::json!({
        "tag_name": tag,
        "name": "",
        "created_at": created_at,
        "prerelease": false,
        "html_url": format!("https://github.com/teksi/wastewater/releases/tag/{tag}"),
        "assets": []
    }))
    .unwrap()
}

#[test]
fn configured_exclusion_filters_releases() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("modules.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = ModulesConfig::load(&path).unwrap();
    let module = Module::from_config(config.find("tww").unwrap());

    let listing = module.parse_releases(&[
        release("v1.9.0", "2023-01-01T00:00:00Z"),
        release("v2.0.0", "2024-01-01T00:00:00Z"),
        release("v1.10.0", "2025-01-01T00:00:00Z"),
    ]);

    assert_eq!(listing.versions.len(), 1);
    assert_eq!(listing.latest.unwrap().name(), "v2.0.0");
}

#[test]
fn experimental_modules_are_hidden_by_default() {
    let config = ModulesConfig::from_toml_str(CONFIG).unwrap();

    let visible: Vec<&str> = config.visible(false).map(|m| m.id.as_str()).collect();
    assert_eq!(visible, ["tww"]);

    let sandbox = Module::from_config(config.find("sandbox").unwrap());
    assert!(sandbox.is_experimental());
    assert_eq!(sandbox.display_name(), "Sandbox (experimental)");
}
