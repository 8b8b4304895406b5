#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! On-disk solution packages
//!
//! A [`PackageArchive`] wraps one package file. It reads and caches the
//! package identity from the embedded manifest and can produce the renamed
//! holding copy used by the legacy upgrade flow.

pub mod holding;
pub mod manifest;

pub use holding::HoldingCopy;
pub use manifest::{
    parse_manifest, read_manifest, rename_unique_name, SolutionManifest, MANIFEST_ENTRY,
};

use soldeploy_errors::{ArchiveError, Error};
use soldeploy_events::{DeployEvent, EventEmitter, EventSender};
use soldeploy_types::{holding_path, PackageDescriptor};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tokio::task;

/// One versioned package file on disk
#[derive(Debug)]
pub struct PackageArchive {
    path: PathBuf,
    force_upgrade: bool,
    descriptor: OnceCell<PackageDescriptor>,
    events: Option<EventSender>,
}

impl PackageArchive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            force_upgrade: false,
            descriptor: OnceCell::new(),
            events: None,
        }
    }

    #[must_use]
    pub fn with_force_upgrade(mut self, force_upgrade: bool) -> Self {
        self.force_upgrade = force_upgrade;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package identity, parsed from the manifest on first use and cached.
    ///
    /// # Errors
    ///
    /// Returns an `ArchiveError` if the file cannot be opened, is not a zip
    /// container, or its manifest entry is missing or unparsable.
    pub async fn describe(&self) -> Result<&PackageDescriptor, Error> {
        self.descriptor
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let manifest = task::spawn_blocking(move || {
                    let file = File::open(&path).map_err(|e| ArchiveError::io(&path, &e))?;
                    read_manifest(BufReader::new(file), &path)
                })
                .await
                .map_err(|e| Error::internal(format!("task join error: {e}")))??;

                tracing::debug!(
                    path = %self.path.display(),
                    name = %manifest.unique_name,
                    version = %manifest.version,
                    "described package"
                );

                Ok::<_, Error>(
                    PackageDescriptor::new(manifest.unique_name, manifest.version, self.path.clone())
                        .with_force_upgrade(self.force_upgrade),
                )
            })
            .await
    }

    /// Write the holding copy next to the original and return its guard.
    ///
    /// The copy's manifest names the package `<name>_Upgrade`; every other
    /// entry is copied byte for byte. Dropping the guard deletes the file.
    ///
    /// # Errors
    ///
    /// Returns an `ArchiveError` if the package cannot be described or the
    /// repack fails. No holding file is left behind in that case.
    pub async fn materialize_holding_copy(&self) -> Result<HoldingCopy, Error> {
        let descriptor = self.describe().await?;
        let original = descriptor.path.clone();
        let holding = descriptor.holding_path.clone();
        let holding_name = descriptor.holding_name.clone();

        let target = holding.clone();
        task::spawn_blocking(move || {
            holding::write_holding_copy(&original, &target, &holding_name)
        })
        .await
        .map_err(|e| Error::internal(format!("task join error: {e}")))??;

        self.events.emit_deploy(DeployEvent::HoldingCopyCreated {
            package: descriptor.unique_name.clone(),
            path: holding.clone(),
        });

        Ok(HoldingCopy::new(
            holding,
            descriptor.unique_name.clone(),
            self.events.clone(),
        ))
    }

    /// Remove a leftover holding file, if any. Never fails.
    pub async fn delete_holding_copy(&self) {
        let holding = holding_path(&self.path);
        match tokio::fs::remove_file(&holding).await {
            Ok(()) => {
                tracing::debug!(path = %holding.display(), "removed stale holding copy");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %holding.display(), error = %e, "could not remove holding copy");
            }
        }
    }
}
