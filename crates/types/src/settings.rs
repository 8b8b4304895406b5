//! Pipeline-wide settings and upgrade strategy selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How an existing package is replaced by a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeStrategy {
    /// Stage a renamed `<name>_Upgrade` copy of the package file, delete the
    /// original by name, then import the real package.
    #[default]
    Legacy,
    /// Import the package as a remote-managed holding package and swap it in
    /// with the atomic delete-and-promote primitive.
    Promote,
}

impl fmt::Display for UpgradeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Promote => write!(f, "promote"),
        }
    }
}

/// Strategy resolved for one package after validation.
///
/// Force-upgrading needs a file-based holding copy, so the promote variant
/// has no force flag: that combination is rejected while validating
/// configuration and cannot reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackageStrategy {
    LegacyHolding { force_upgrade: bool },
    AtomicPromote,
}

impl PackageStrategy {
    /// Strategy for a package under the pipeline-wide upgrade API.
    ///
    /// Returns `None` for the unsupported force-upgrade under promote.
    #[must_use]
    pub fn resolve(upgrade: UpgradeStrategy, force_upgrade: bool) -> Option<Self> {
        match upgrade {
            UpgradeStrategy::Legacy => Some(Self::LegacyHolding { force_upgrade }),
            UpgradeStrategy::Promote if force_upgrade => None,
            UpgradeStrategy::Promote => Some(Self::AtomicPromote),
        }
    }

    #[must_use]
    pub fn force_upgrade(self) -> bool {
        match self {
            Self::LegacyHolding { force_upgrade } => force_upgrade,
            Self::AtomicPromote => false,
        }
    }

    #[must_use]
    pub fn upgrade_strategy(self) -> UpgradeStrategy {
        match self {
            Self::LegacyHolding { .. } => UpgradeStrategy::Legacy,
            Self::AtomicPromote => UpgradeStrategy::Promote,
        }
    }
}

/// What a phase does when one package fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the remaining packages of the phase
    #[default]
    FailFast,
    /// Record the failure and continue; the phase fails at the end
    Continue,
}

/// Global pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub use_holding_packages: bool,
    pub upgrade_strategy: UpgradeStrategy,
    pub async_import: bool,
    pub async_upgrade: bool,
    pub poll_interval: Duration,
    pub async_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            use_holding_packages: true,
            upgrade_strategy: UpgradeStrategy::Legacy,
            async_import: false,
            async_upgrade: false,
            poll_interval: Duration::from_secs(15),
            async_timeout: Duration::from_secs(3600),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}
