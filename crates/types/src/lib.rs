#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the soldeploy solution deployer
//!
//! This crate provides the value types shared by every layer: solution
//! versions, package identity, import settings and results.

pub mod import;
pub mod package;
pub mod phase;
pub mod settings;
pub mod version;

// Re-export commonly used types
pub use import::{AsyncJobStatus, ImportOptions, ImportResultState, RemoteImportResult};
pub use package::{holding_name, holding_path, ImportSettings, PackageDescriptor, HOLDING_SUFFIX};
pub use phase::DeployPhase;
pub use settings::{FailurePolicy, PackageStrategy, PipelineSettings, UpgradeStrategy};
pub use version::{ParseVersionError, SolutionVersion};
