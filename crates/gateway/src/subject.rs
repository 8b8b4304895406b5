//! What an import uploads

use soldeploy_types::{PackageDescriptor, SolutionVersion};
use std::path::PathBuf;

/// A package file to import, with the identity used in progress events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSubject {
    pub unique_name: String,
    pub version: SolutionVersion,
    pub path: PathBuf,
}

impl ImportSubject {
    /// The original package file
    #[must_use]
    pub fn original(descriptor: &PackageDescriptor) -> Self {
        Self {
            unique_name: descriptor.unique_name.clone(),
            version: descriptor.version,
            path: descriptor.path.clone(),
        }
    }

    /// The renamed holding copy of the package
    #[must_use]
    pub fn holding(descriptor: &PackageDescriptor) -> Self {
        Self {
            unique_name: descriptor.holding_name.clone(),
            version: descriptor.version,
            path: descriptor.holding_path.clone(),
        }
    }
}
