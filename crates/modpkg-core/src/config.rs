//! Modules configuration.
//!
//! The list of modules the user can pick from is a TOML document:
//!
//! ```toml
//! [[modules]]
//! name = "TEKSI Wastewater"
//! id = "tww"
//! organisation = "teksi"
//! repository = "wastewater"
//! exclude_releases = "^v1\\."
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating the modules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse modules configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid modules configuration: {0}")]
    Invalid(String),
}

/// One configured module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub id: String,
    pub organisation: String,
    pub repository: String,
    /// Regex; releases whose tag matches are hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_releases: Option<String>,
    /// Hidden unless experimental modules are enabled.
    #[serde(default)]
    pub experimental: bool,
}

/// The full modules configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesConfig {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl ModulesConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject duplicate ids, empty coordinates and invalid exclusion patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "module '{}' has an empty id",
                    module.name
                )));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate module id '{}'",
                    module.id
                )));
            }
            if module.organisation.trim().is_empty() || module.repository.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "module '{}' needs both organisation and repository",
                    module.id
                )));
            }
            if let Some(pattern) = module.exclude_releases.as_deref() {
                regex::Regex::new(pattern).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "module '{}' has an invalid exclude_releases pattern: {e}",
                        module.id
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Modules to offer, optionally including experimental ones.
    pub fn visible(&self, include_experimental: bool) -> impl Iterator<Item = &ModuleConfig> {
        self.modules
            .iter()
            .filter(move |m| include_experimental || !m.experimental)
    }
}
