//! Package identity and per-package import settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::SolutionVersion;

/// Suffix appended to unique names and file stems of holding packages
pub const HOLDING_SUFFIX: &str = "_Upgrade";

/// Holding unique name for a package (`<name>_Upgrade`)
#[must_use]
pub fn holding_name(unique_name: &str) -> String {
    format!("{unique_name}{HOLDING_SUFFIX}")
}

/// Holding file path for a package file: `<stem>_Upgrade<.ext>` in the same
/// directory as the original.
#[must_use]
pub fn holding_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match original.extension() {
        Some(ext) => format!("{stem}{HOLDING_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{HOLDING_SUFFIX}"),
    };
    original.with_file_name(file_name)
}

/// Identity of one on-disk solution package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub unique_name: String,
    pub version: SolutionVersion,
    pub path: PathBuf,
    pub holding_name: String,
    pub holding_path: PathBuf,
    pub force_upgrade: bool,
}

impl PackageDescriptor {
    #[must_use]
    pub fn new(unique_name: impl Into<String>, version: SolutionVersion, path: PathBuf) -> Self {
        let unique_name = unique_name.into();
        Self {
            holding_name: holding_name(&unique_name),
            holding_path: holding_path(&path),
            unique_name,
            version,
            path,
            force_upgrade: false,
        }
    }

    #[must_use]
    pub fn with_force_upgrade(mut self, force_upgrade: bool) -> Self {
        self.force_upgrade = force_upgrade;
        self
    }
}

/// Per-package import settings supplied by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSettings {
    pub install_order: u32,
    /// Package is only ever removed, never installed
    pub delete_only: bool,
    pub overwrite_unmanaged: bool,
    pub publish_workflows: bool,
    pub force_upgrade: bool,
    pub use_async: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_path_keeps_directory_and_extension() {
        let path = holding_path(Path::new("/deploy/solutions/Core_2_0_0.zip"));
        assert_eq!(path, PathBuf::from("/deploy/solutions/Core_2_0_0_Upgrade.zip"));
    }

    #[test]
    fn test_holding_path_without_extension() {
        let path = holding_path(Path::new("pkg/Core"));
        assert_eq!(path, PathBuf::from("pkg/Core_Upgrade"));
    }

    #[test]
    fn test_descriptor_derives_holding_identity() {
        let desc = PackageDescriptor::new(
            "Core",
            SolutionVersion::new(2, 0, 0),
            PathBuf::from("Core.zip"),
        );
        assert_eq!(desc.holding_name, "Core_Upgrade");
        assert_eq!(desc.holding_path, PathBuf::from("Core_Upgrade.zip"));
        assert!(!desc.force_upgrade);
    }
}
