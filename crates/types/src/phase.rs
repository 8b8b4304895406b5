//! Deployment pipeline phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three phases of one deployment run, in the order a host runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    InstallHolding,
    DeleteOriginal,
    InstallUpdated,
}

impl DeployPhase {
    pub const ALL: [Self; 3] = [
        Self::InstallHolding,
        Self::DeleteOriginal,
        Self::InstallUpdated,
    ];

    /// Whether the phase walks packages in reverse install order
    #[must_use]
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::DeleteOriginal)
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstallHolding => write!(f, "install-holding"),
            Self::DeleteOriginal => write!(f, "delete-original"),
            Self::InstallUpdated => write!(f, "install-updated"),
        }
    }
}
