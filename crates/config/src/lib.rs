#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for soldeploy
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/soldeploy/deploy.toml)
//! - Environment variables
//!
//! CLI flags are applied by the host on top of the merged result, which is
//! then validated into a [`DeploymentPlan`].

pub mod sections;
pub mod plan;

pub use sections::{PackageEntry, PipelineConfig};
pub use plan::{check_pipeline_settings, DeploymentPlan, PlannedPackage};

use serde::{Deserialize, Serialize};
use soldeploy_errors::{ConfigError, Error};
use soldeploy_types::UpgradeStrategy;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("soldeploy").join("deploy.toml"))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let mut config = Self::from_toml(&contents)?;
        config.source = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            packages = config.packages.len(),
            "loaded deployment configuration"
        );
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // SOLDEPLOY_UPGRADE_API
        if let Ok(api) = std::env::var("SOLDEPLOY_UPGRADE_API") {
            self.pipeline.upgrade_api = match api.as_str() {
                "legacy" => UpgradeStrategy::Legacy,
                "promote" => UpgradeStrategy::Promote,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SOLDEPLOY_UPGRADE_API".to_string(),
                        value: api,
                    }
                    .into())
                }
            };
        }

        // SOLDEPLOY_USE_HOLDING
        if let Ok(holding) = std::env::var("SOLDEPLOY_USE_HOLDING") {
            self.pipeline.use_holding_packages = parse_bool("SOLDEPLOY_USE_HOLDING", holding)?;
        }

        // SOLDEPLOY_ASYNC_IMPORT
        if let Ok(value) = std::env::var("SOLDEPLOY_ASYNC_IMPORT") {
            self.pipeline.async_import = parse_bool("SOLDEPLOY_ASYNC_IMPORT", value)?;
        }

        // SOLDEPLOY_POLL_INTERVAL
        if let Ok(interval) = std::env::var("SOLDEPLOY_POLL_INTERVAL") {
            self.pipeline.poll_interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SOLDEPLOY_POLL_INTERVAL".to_string(),
                    value: interval,
                })?;
        }

        // SOLDEPLOY_ASYNC_TIMEOUT
        if let Ok(timeout) = std::env::var("SOLDEPLOY_ASYNC_TIMEOUT") {
            self.pipeline.async_timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SOLDEPLOY_ASYNC_TIMEOUT".to_string(),
                    value: timeout,
                })?;
        }

        Ok(())
    }

    /// Directory relative package paths are resolved against
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Validate settings and resolve packages into install order
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a zero poll interval, a timeout shorter
    /// than the poll interval, duplicate package paths, or a package that
    /// asks for `force_upgrade` under the promote upgrade API.
    pub fn validate(&self) -> Result<DeploymentPlan, Error> {
        plan::build_plan(&self.pipeline, &self.packages, &self.base_dir())
    }
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
