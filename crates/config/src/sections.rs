//! Configuration sections as they appear in the TOML file

use serde::{Deserialize, Serialize};
use soldeploy_types::{FailurePolicy, ImportSettings, UpgradeStrategy};
use std::path::PathBuf;

/// `[pipeline]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_use_holding_packages")]
    pub use_holding_packages: bool,
    #[serde(default)]
    pub upgrade_api: UpgradeStrategy,
    #[serde(default)]
    pub async_import: bool,
    #[serde(default)]
    pub async_upgrade: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_async_timeout_secs")]
    pub async_timeout_secs: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_holding_packages: default_use_holding_packages(),
            upgrade_api: UpgradeStrategy::Legacy,
            async_import: false,
            async_upgrade: false,
            poll_interval_secs: default_poll_interval_secs(),
            async_timeout_secs: default_async_timeout_secs(),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// One `[[packages]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub install_order: u32,
    #[serde(default)]
    pub delete_only: bool,
    #[serde(default = "default_true")]
    pub overwrite_unmanaged: bool,
    #[serde(default = "default_true")]
    pub publish_workflows: bool,
    #[serde(default)]
    pub force_upgrade: bool,
    #[serde(default)]
    pub use_async: bool,
}

impl PackageEntry {
    /// Entry for `path` with every flag at its default
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            install_order: 0,
            delete_only: false,
            overwrite_unmanaged: true,
            publish_workflows: true,
            force_upgrade: false,
            use_async: false,
        }
    }

    #[must_use]
    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            install_order: self.install_order,
            delete_only: self.delete_only,
            overwrite_unmanaged: self.overwrite_unmanaged,
            publish_workflows: self.publish_workflows,
            force_upgrade: self.force_upgrade,
            use_async: self.use_async,
        }
    }
}

// Default value functions for serde
fn default_use_holding_packages() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_async_timeout_secs() -> u64 {
    3600 // 1 hour
}

fn default_true() -> bool {
    true
}
