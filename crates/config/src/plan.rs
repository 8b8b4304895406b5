//! Validation of a loaded configuration into an executable deployment plan

use serde::{Deserialize, Serialize};
use soldeploy_errors::{ConfigError, Error};
use soldeploy_types::{ImportSettings, PackageStrategy, PipelineSettings, UpgradeStrategy};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sections::{PackageEntry, PipelineConfig};

/// One package ready for the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPackage {
    /// Absolute (or base-relative) package file path
    pub path: PathBuf,
    pub settings: ImportSettings,
    pub strategy: PackageStrategy,
}

/// Validated pipeline settings plus packages in install order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub settings: PipelineSettings,
    pub packages: Vec<PlannedPackage>,
}

impl DeploymentPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Reject polling settings that would spin or could never complete a poll.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a zero poll interval and
/// `ConfigError::Invalid` when the async timeout is shorter than one interval.
pub fn check_pipeline_settings(settings: &PipelineSettings) -> Result<(), Error> {
    if settings.poll_interval.is_zero() {
        return Err(ConfigError::InvalidValue {
            field: "pipeline.poll_interval_secs".to_string(),
            value: "0".to_string(),
        }
        .into());
    }

    if settings.async_timeout < settings.poll_interval {
        return Err(ConfigError::Invalid {
            message: format!(
                "async timeout ({:?}) is shorter than poll interval ({:?})",
                settings.async_timeout, settings.poll_interval
            ),
        }
        .into());
    }

    Ok(())
}

pub(crate) fn pipeline_settings(pipeline: &PipelineConfig) -> Result<PipelineSettings, Error> {
    let settings = PipelineSettings {
        use_holding_packages: pipeline.use_holding_packages,
        upgrade_strategy: pipeline.upgrade_api,
        async_import: pipeline.async_import,
        async_upgrade: pipeline.async_upgrade,
        poll_interval: Duration::from_secs(pipeline.poll_interval_secs),
        async_timeout: Duration::from_secs(pipeline.async_timeout_secs),
        failure_policy: pipeline.failure_policy,
    };
    check_pipeline_settings(&settings)?;
    Ok(settings)
}

pub(crate) fn package_strategy(
    entry: &PackageEntry,
    upgrade: UpgradeStrategy,
) -> Result<PackageStrategy, Error> {
    PackageStrategy::resolve(upgrade, entry.force_upgrade).ok_or_else(|| {
        ConfigError::Incompatible {
            package: entry.path.display().to_string(),
            reason: "force_upgrade requires file-based holding packages".to_string(),
        }
        .into()
    })
}

pub(crate) fn build_plan(
    pipeline: &PipelineConfig,
    entries: &[PackageEntry],
    base_dir: &Path,
) -> Result<DeploymentPlan, Error> {
    let settings = pipeline_settings(pipeline)?;

    let mut seen = HashSet::new();
    let mut packages = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = if entry.path.is_absolute() {
            entry.path.clone()
        } else {
            base_dir.join(&entry.path)
        };

        if !seen.insert(path.clone()) {
            return Err(ConfigError::DuplicatePackage {
                path: path.display().to_string(),
            }
            .into());
        }

        packages.push(PlannedPackage {
            strategy: package_strategy(entry, settings.upgrade_strategy)?,
            settings: entry.import_settings(),
            path,
        });
    }

    // sort_by_key is stable: ties keep their file order
    packages.sort_by_key(|p| p.settings.install_order);

    Ok(DeploymentPlan { settings, packages })
}
