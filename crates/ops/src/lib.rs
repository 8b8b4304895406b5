#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deployment orchestration for soldeploy
//!
//! This crate sits between the CLI and the specialized crates. It holds the
//! per-package upgrade decisions and the three-phase pipeline that carries
//! them out against a remote service, plus the small single-package
//! operations the CLI exposes.

mod benign;
pub mod decision;
mod pipeline;
mod query;
mod types;

pub use benign::{is_benign_holding_failure, BENIGN_HOLDING_FAILURES};
pub use decision::{
    is_current, DeleteDecision, HoldingDecision, InstallState, PackageUpgradeDecision,
    RemoteState, UpdateDecision,
};
pub use pipeline::{DeploymentPipeline, PipelinePackage};
pub use query::{inspect_package, plan_entries, stage_holding_copy};
pub use types::{
    DeploymentReport, OperationResult, PackageAction, PackageInfo, PackageOutcome, PhaseReport,
    PlanEntry, SkipReason,
};
