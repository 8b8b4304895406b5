//! Per-package upgrade decisions
//!
//! Decisions are pure: they take the package's settings and the remote state
//! observed right before the phase acts, and say what to do. The pipeline
//! carries them out. Because every decision is re-derived from live remote
//! state, re-running any phase after a crash is safe.

use soldeploy_types::{PackageStrategy, PipelineSettings, SolutionVersion, UpgradeStrategy};

use crate::types::SkipReason;

/// Remote state of one package and its holding package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteState {
    pub installed: Option<SolutionVersion>,
    pub holding: Option<SolutionVersion>,
}

/// Classification of the remote state relative to the package version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Absent,
    /// Installed below the package version
    InstalledOlder(SolutionVersion),
    /// Installed at or above the package version
    InstalledCurrent(SolutionVersion),
    HoldingPresentSameVersion,
    HoldingPresentOtherVersion(SolutionVersion),
}

impl InstallState {
    /// Classify the installed package, then its holding package.
    ///
    /// Holding states are only reported when nothing is installed under the
    /// original name.
    #[must_use]
    pub fn classify(remote: RemoteState, target: SolutionVersion) -> Self {
        match (remote.installed, remote.holding) {
            (Some(installed), _) if installed >= target => Self::InstalledCurrent(installed),
            (Some(installed), _) => Self::InstalledOlder(installed),
            (None, Some(holding)) if holding == target => Self::HoldingPresentSameVersion,
            (None, Some(holding)) => Self::HoldingPresentOtherVersion(holding),
            (None, None) => Self::Absent,
        }
    }
}

/// What the install-holding phase does for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldingDecision {
    Skip(SkipReason),
    /// Nothing installed: import the original directly
    ImportOriginal,
    /// Materialize the renamed holding copy and import it
    StageLegacyCopy,
    /// Import the original flagged as a remote-managed holding package
    StageRemoteHolding,
}

/// What the delete-original phase does for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteDecision {
    Skip(SkipReason),
    Delete,
    Promote,
    /// Refuse to delete: the staged replacement is missing or wrong
    Inconsistent(String),
}

/// What the install-updated phase does for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    Skip(SkipReason),
    /// Final version already installed, but a holding package an
    /// interrupted run left behind must still be removed if present
    SkipAndClearHolding(SkipReason),
    /// Import the original; remove a leftover holding package afterwards
    /// when `cleanup_holding` is set
    Import { cleanup_holding: bool },
}

/// Version gate: true when `installed` already satisfies `target`
#[must_use]
pub fn is_current(installed: Option<SolutionVersion>, target: SolutionVersion, force: bool) -> bool {
    !force && installed.is_some_and(|v| v >= target)
}

/// Decision inputs for one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageUpgradeDecision {
    pub target: SolutionVersion,
    pub strategy: PackageStrategy,
    pub delete_only: bool,
    pub use_holding: bool,
}

impl PackageUpgradeDecision {
    #[must_use]
    pub fn new(
        target: SolutionVersion,
        strategy: PackageStrategy,
        delete_only: bool,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            target,
            strategy,
            delete_only,
            use_holding: settings.use_holding_packages,
        }
    }

    fn force(&self) -> bool {
        self.strategy.force_upgrade()
    }

    /// Holding packages are part of this package's upgrade
    #[must_use]
    pub fn holding_required(&self) -> bool {
        self.use_holding && !self.delete_only
    }

    /// Skip reason for the install-holding phase known without remote state
    #[must_use]
    pub fn holding_precheck(&self) -> Option<SkipReason> {
        if self.delete_only {
            Some(SkipReason::DeleteOnly)
        } else if !self.use_holding {
            Some(SkipReason::HoldingDisabled)
        } else {
            None
        }
    }

    #[must_use]
    pub fn holding(&self, remote: RemoteState) -> HoldingDecision {
        if let Some(reason) = self.holding_precheck() {
            return HoldingDecision::Skip(reason);
        }

        match InstallState::classify(remote, self.target) {
            // First install: there is no existing version to protect
            InstallState::Absent => return HoldingDecision::ImportOriginal,
            InstallState::InstalledCurrent(installed) if !self.force() => {
                return HoldingDecision::Skip(SkipReason::AlreadyInstalled { installed });
            }
            _ => {}
        }

        if remote.holding == Some(self.target) && !self.force() {
            return HoldingDecision::Skip(SkipReason::AlreadyStaged);
        }

        match self.strategy {
            PackageStrategy::LegacyHolding { .. } => HoldingDecision::StageLegacyCopy,
            PackageStrategy::AtomicPromote => HoldingDecision::StageRemoteHolding,
        }
    }

    /// Skip reason for the delete-original phase known without remote state
    #[must_use]
    pub fn delete_precheck(&self) -> Option<SkipReason> {
        if self.use_holding || self.delete_only {
            None
        } else {
            Some(SkipReason::OriginalPreserved)
        }
    }

    #[must_use]
    pub fn delete(&self, remote: RemoteState) -> DeleteDecision {
        if let Some(reason) = self.delete_precheck() {
            return DeleteDecision::Skip(reason);
        }

        let Some(installed) = remote.installed else {
            return DeleteDecision::Skip(SkipReason::NotInstalled);
        };

        if !self.delete_only && is_current(Some(installed), self.target, self.force()) {
            return DeleteDecision::Skip(SkipReason::AlreadyInstalled { installed });
        }

        if self.delete_only {
            return DeleteDecision::Delete;
        }

        if remote.holding != Some(self.target) {
            let found = remote
                .holding
                .map_or_else(|| "none".to_string(), |v| v.to_string());
            return DeleteDecision::Inconsistent(format!(
                "holding package must be at {} before the original is removed, found {found}",
                self.target
            ));
        }

        match self.strategy.upgrade_strategy() {
            UpgradeStrategy::Legacy => DeleteDecision::Delete,
            UpgradeStrategy::Promote => DeleteDecision::Promote,
        }
    }

    #[must_use]
    pub fn update(&self, installed: Option<SolutionVersion>) -> UpdateDecision {
        if self.delete_only {
            return UpdateDecision::Skip(SkipReason::DeleteOnly);
        }

        if let Some(installed) = installed {
            if is_current(Some(installed), self.target, self.force()) {
                let reason = SkipReason::AlreadyInstalled { installed };
                return if self.holding_required() {
                    UpdateDecision::SkipAndClearHolding(reason)
                } else {
                    UpdateDecision::Skip(reason)
                };
            }
        }

        UpdateDecision::Import {
            cleanup_holding: self.holding_required(),
        }
    }
}
