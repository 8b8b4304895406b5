//! Holding copies of a package and the guard that removes them
//!
//! A holding copy is written to a temporary file next to the target and
//! persisted over the holding path only once the repack is complete, so an
//! interrupted rewrite never leaves a half-written archive behind.

use soldeploy_errors::ArchiveError;
use soldeploy_events::{DeployEvent, EventEmitter, EventSender};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::manifest::{rename_unique_name, MANIFEST_ENTRY};

fn repack_error(path: &Path, message: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Repack {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Repack `original` into `holding` with the manifest unique name replaced.
///
/// Entries other than the manifest are raw-copied without recompression.
pub(crate) fn write_holding_copy(
    original: &Path,
    holding: &Path,
    holding_name: &str,
) -> Result<(), ArchiveError> {
    let file = File::open(original).map_err(|e| ArchiveError::io(original, &e))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::corrupt(original, e))?;

    let dir = match holding.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| repack_error(holding, e))?;

    let mut manifest_seen = false;
    {
        let mut writer = ZipWriter::new(temp.as_file_mut());

        for index in 0..archive.len() {
            let is_manifest = archive
                .by_index_raw(index)
                .map_err(|e| ArchiveError::corrupt(original, e))?
                .name()
                == MANIFEST_ENTRY;

            if is_manifest {
                let mut entry = archive
                    .by_index(index)
                    .map_err(|e| ArchiveError::corrupt(original, e))?;
                let compression = entry.compression();
                let mut xml = String::new();
                entry
                    .read_to_string(&mut xml)
                    .map_err(|e| ArchiveError::corrupt(original, e))?;
                drop(entry);

                let rewritten = rename_unique_name(&xml, holding_name, original)?;
                let options = SimpleFileOptions::default().compression_method(compression);
                writer
                    .start_file(MANIFEST_ENTRY, options)
                    .map_err(|e| repack_error(holding, e))?;
                writer
                    .write_all(rewritten.as_bytes())
                    .map_err(|e| repack_error(holding, e))?;
                manifest_seen = true;
            } else {
                let entry = archive
                    .by_index_raw(index)
                    .map_err(|e| ArchiveError::corrupt(original, e))?;
                writer
                    .raw_copy_file(entry)
                    .map_err(|e| repack_error(holding, e))?;
            }
        }

        writer.finish().map_err(|e| repack_error(holding, e))?;
    }

    if !manifest_seen {
        return Err(ArchiveError::MissingManifest {
            path: original.display().to_string(),
            entry: MANIFEST_ENTRY.to_string(),
        });
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| repack_error(holding, e))?;
    temp.persist(holding)
        .map_err(|e| repack_error(holding, e.error))?;

    Ok(())
}

/// RAII guard for a materialized holding copy
///
/// The file is removed synchronously when the guard drops, on every exit
/// path of the upgrade that created it.
#[derive(Debug)]
pub struct HoldingCopy {
    path: PathBuf,
    package: String,
    events: Option<EventSender>,
    kept: bool,
}

impl HoldingCopy {
    pub(crate) fn new(path: PathBuf, package: String, events: Option<EventSender>) -> Self {
        Self {
            path,
            package,
            events,
            kept: false,
        }
    }

    /// Disarm the guard and leave the file in place
    #[must_use]
    pub fn keep(mut self) -> PathBuf {
        self.kept = true;
        self.path.clone()
    }

    /// Location of the holding file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique name of the package the copy was made from
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }
}

impl Drop for HoldingCopy {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => self.events.emit_deploy(DeployEvent::HoldingCopyRemoved {
                package: self.package.clone(),
                path: self.path.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove holding copy"
                );
                self.events.emit_warning_with_context(
                    format!("holding copy for {} was not removed", self.package),
                    e.to_string(),
                );
            }
        }
    }
}
