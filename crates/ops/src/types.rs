//! Types for phase and deployment results

use serde::{Deserialize, Serialize};
use soldeploy_errors::{DeployError, Error};
use soldeploy_events::FailureContext;
use soldeploy_types::{DeployPhase, PackageDescriptor, PackageStrategy, SolutionVersion};
use std::fmt;
use std::path::PathBuf;

/// Why a package needed no remote work in a phase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Package is only ever removed
    DeleteOnly,
    /// Holding packages are disabled for this run
    HoldingDisabled,
    /// Installed version already satisfies the package
    AlreadyInstalled { installed: SolutionVersion },
    /// A holding package at the target version is already staged
    AlreadyStaged,
    /// Nothing installed to delete
    NotInstalled,
    /// Originals stay in place until a holding package replaces them
    OriginalPreserved,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteOnly => write!(f, "delete-only package"),
            Self::HoldingDisabled => write!(f, "holding packages disabled"),
            Self::AlreadyInstalled { installed } => write!(f, "already installed ({installed})"),
            Self::AlreadyStaged => write!(f, "holding package already staged"),
            Self::NotInstalled => write!(f, "not installed"),
            Self::OriginalPreserved => write!(f, "original preserved"),
        }
    }
}

/// What a phase did for one package
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PackageAction {
    Skipped { reason: SkipReason },
    Imported,
    ImportedHolding,
    Deleted,
    Promoted,
    HoldingDeleted,
    Failed { failure: FailureContext },
}

impl PackageAction {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Imported => write!(f, "imported"),
            Self::ImportedHolding => write!(f, "imported holding package"),
            Self::Deleted => write!(f, "deleted"),
            Self::Promoted => write!(f, "promoted"),
            Self::HoldingDeleted => write!(f, "holding package deleted"),
            Self::Failed { failure } => write!(f, "failed: {}", failure.message),
        }
    }
}

/// One package's result within a phase
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageOutcome {
    pub package: String,
    /// Absent when the package could not be described
    pub version: Option<SolutionVersion>,
    pub action: PackageAction,
    /// Remote message accompanying the action, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of running one phase over every package
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: DeployPhase,
    pub outcomes: Vec<PackageOutcome>,
    pub duration_ms: u64,
}

impl PhaseReport {
    #[must_use]
    pub fn new(phase: DeployPhase) -> Self {
        Self {
            phase,
            outcomes: Vec::new(),
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.action.is_failure()).count()
    }

    /// Outcomes that changed remote state
    pub fn changes(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.action, PackageAction::Skipped { .. } | PackageAction::Failed { .. }))
    }

    /// Turn recorded package failures into an error
    ///
    /// # Errors
    ///
    /// Returns `DeployError::PhaseFailed` when any package failed.
    pub fn ensure_success(&self) -> Result<(), Error> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(DeployError::PhaseFailed {
                phase: self.phase.to_string(),
                failed,
            }
            .into()),
        }
    }
}

/// Results of a full three-phase run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub phases: Vec<PhaseReport>,
}

impl DeploymentReport {
    #[must_use]
    pub fn phase(&self, phase: DeployPhase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.phases.iter().map(PhaseReport::failed).sum()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Identity of a package file plus what the remote currently has
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageInfo {
    pub unique_name: String,
    pub version: SolutionVersion,
    pub path: PathBuf,
    pub holding_name: String,
    pub holding_path: PathBuf,
    /// Installed version, when a remote was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<SolutionVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_installed: Option<SolutionVersion>,
}

impl PackageInfo {
    #[must_use]
    pub fn from_descriptor(descriptor: &PackageDescriptor) -> Self {
        Self {
            unique_name: descriptor.unique_name.clone(),
            version: descriptor.version,
            path: descriptor.path.clone(),
            holding_name: descriptor.holding_name.clone(),
            holding_path: descriptor.holding_path.clone(),
            installed: None,
            holding_installed: None,
        }
    }
}

/// One row of a validated deployment plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanEntry {
    pub install_order: u32,
    pub path: PathBuf,
    pub strategy: PackageStrategy,
    pub delete_only: bool,
    pub use_async: bool,
}

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Package inspection
    PackageInfo(PackageInfo),
    /// Holding copy written to disk
    HoldingStaged(PathBuf),
    /// Validated plan in install order
    Plan(Vec<PlanEntry>),
    /// One phase run
    Phase(PhaseReport),
    /// Full three-phase run
    Deployment(DeploymentReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::PackageInfo(_) | Self::HoldingStaged(_) | Self::Plan(_) => true,
            Self::Phase(report) => report.failed() == 0,
            Self::Deployment(report) => report.is_success(),
        }
    }
}
