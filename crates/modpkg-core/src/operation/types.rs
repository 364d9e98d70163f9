//! Migration operation request types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Package;
use crate::ports::Parameters;

/// What the migration engine should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Install the module, then optionally load a demo data set.
    Install {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        demo_data: Option<String>,
    },
    Upgrade,
    Uninstall,
    /// Create the module's roles and grant their privileges.
    Roles,
}

impl OperationKind {
    /// Short verb used in log lines and progress messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
            Self::Roles => "roles",
        }
    }
}

/// Options forwarded to the engine plus the runner's own commit switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Commit the shared connection after a successful, uncancelled run.
    #[serde(default = "default_commit")]
    pub commit: bool,
    /// The installed version came from an unstable source (branch, pull
    /// request or prerelease).
    #[serde(default)]
    pub beta_testing: bool,
    /// Engine-specific options passed through untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

const fn default_commit() -> bool {
    true
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            commit: true,
            beta_testing: false,
            extra: BTreeMap::new(),
        }
    }
}

impl OperationOptions {
    /// Options for installing or upgrading to `package`.
    pub fn for_package(package: &Package) -> Self {
        Self {
            beta_testing: package.is_unstable(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Everything needed to start one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    /// Module the caller selected; checked against the engine configuration.
    pub module_id: String,
    pub kind: OperationKind,
    pub parameters: Parameters,
    pub options: OperationOptions,
}

impl OperationRequest {
    pub fn new(module_id: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            module_id: module_id.into(),
            kind,
            parameters: Parameters::new(),
            options: OperationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: OperationOptions) -> Self {
        self.options = options;
        self
    }
}
