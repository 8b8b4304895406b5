//! Single-package operations used by the CLI outside a full deployment

use soldeploy_archive::PackageArchive;
use soldeploy_config::DeploymentPlan;
use soldeploy_errors::Error;
use soldeploy_events::EventSender;
use soldeploy_remote::RemoteService;
use std::path::{Path, PathBuf};

use crate::types::{PackageInfo, PlanEntry};

fn open(path: &Path, events: Option<&EventSender>) -> PackageArchive {
    let archive = PackageArchive::new(path);
    match events {
        Some(events) => archive.with_event_sender(events.clone()),
        None => archive,
    }
}

/// Describe a package file, and its remote state when a remote is given.
///
/// # Errors
///
/// Returns an error if the package cannot be read or the remote query fails.
pub async fn inspect_package(
    path: &Path,
    remote: Option<&dyn RemoteService>,
    events: Option<&EventSender>,
) -> Result<PackageInfo, Error> {
    let archive = open(path, events);
    let descriptor = archive.describe().await?;
    let mut info = PackageInfo::from_descriptor(descriptor);

    if let Some(remote) = remote {
        info.installed = remote
            .resolve_installed_version(&descriptor.unique_name)
            .await?;
        info.holding_installed = remote
            .resolve_installed_version(&descriptor.holding_name)
            .await?;
    }

    Ok(info)
}

/// Write the renamed holding copy next to the package and leave it there.
///
/// # Errors
///
/// Returns an error if the package cannot be read or the copy cannot be
/// written.
pub async fn stage_holding_copy(
    path: &Path,
    events: Option<&EventSender>,
) -> Result<PathBuf, Error> {
    let copy = open(path, events).materialize_holding_copy().await?;
    tracing::info!(package = copy.package(), path = %copy.path().display(), "holding copy staged");
    Ok(copy.keep())
}

/// Flatten a validated plan for display
#[must_use]
pub fn plan_entries(plan: &DeploymentPlan) -> Vec<PlanEntry> {
    plan.packages
        .iter()
        .map(|p| PlanEntry {
            install_order: p.settings.install_order,
            path: p.path.clone(),
            strategy: p.strategy,
            delete_only: p.settings.delete_only,
            use_async: p.settings.use_async,
        })
        .collect()
}
