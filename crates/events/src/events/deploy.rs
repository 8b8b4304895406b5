use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use soldeploy_types::{AsyncJobStatus, DeployPhase, SolutionVersion};

use super::FailureContext;

/// Deployment events emitted by the archive, gateway and pipeline layers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployEvent {
    PhaseStarted {
        phase: DeployPhase,
        packages: usize,
    },

    PhaseCompleted {
        phase: DeployPhase,
        processed: usize,
        failed: usize,
    },

    PackageStarted {
        phase: DeployPhase,
        package: String,
        version: SolutionVersion,
    },

    /// Package handled; `action` is the human summary of what happened
    PackageFinished {
        phase: DeployPhase,
        package: String,
        version: SolutionVersion,
        action: String,
    },

    /// `version` is absent when the package could not be described
    PackageFailed {
        phase: DeployPhase,
        package: String,
        version: Option<SolutionVersion>,
        failure: FailureContext,
    },

    /// Free-form progress line for one package
    Progress {
        package: String,
        version: SolutionVersion,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One tick of an async import poll loop
    ImportPolled {
        package: String,
        job_id: String,
        status: AsyncJobStatus,
        message: String,
        elapsed_ms: u64,
    },

    HoldingCopyCreated {
        package: String,
        path: PathBuf,
    },

    HoldingCopyRemoved {
        package: String,
        path: PathBuf,
    },
}

impl DeployEvent {
    /// Package this event refers to, when it refers to one
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::PhaseStarted { .. } | Self::PhaseCompleted { .. } => None,
            Self::PackageStarted { package, .. }
            | Self::PackageFinished { package, .. }
            | Self::PackageFailed { package, .. }
            | Self::Progress { package, .. }
            | Self::ImportPolled { package, .. }
            | Self::HoldingCopyCreated { package, .. }
            | Self::HoldingCopyRemoved { package, .. } => Some(package),
        }
    }
}
