//! File-backed remote service for development

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soldeploy_archive::read_manifest;
use soldeploy_errors::{Error, RemoteError};
use soldeploy_types::{
    holding_name, AsyncJobStatus, ImportResultState, RemoteImportResult, SolutionVersion,
};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{AsyncJobSnapshot, ImportRequest, RemoteService};

/// The uploaded bytes are not a readable solution package
pub const FAULT_INVALID_PACKAGE: i32 = -2_147_188_720;
/// A holding import or upgrade needs an installed base solution
pub const FAULT_MISSING_BASE: i32 = -2_147_188_682;
/// Promote was requested with no staged holding package
pub const FAULT_NO_HOLDING: i32 = -2_147_188_681;

const CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstalledSolution {
    version: SolutionVersion,
    installed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingImport {
    import_job_id: Uuid,
    label: String,
    package_bytes: Vec<u8>,
    as_holding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AsyncJob {
    status: AsyncJobStatus,
    message: String,
    polls_remaining: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending: Option<PendingImport>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogState {
    #[serde(default)]
    solutions: BTreeMap<String, InstalledSolution>,
    #[serde(default)]
    jobs: BTreeMap<String, AsyncJob>,
    #[serde(default)]
    reports: BTreeMap<String, RemoteImportResult>,
}

/// Remote service kept in `catalog.json` under a directory
///
/// Async jobs report `InProgress` for a configurable number of polls and
/// apply the import on the poll after that.
#[derive(Debug)]
pub struct LocalCatalog {
    base: PathBuf,
    async_polls: u32,
    lock: Mutex<()>,
}

impl LocalCatalog {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            async_polls: 1,
            lock: Mutex::new(()),
        }
    }

    /// Number of `InProgress` polls before an async job completes
    #[must_use]
    pub fn with_async_polls(mut self, polls: u32) -> Self {
        self.async_polls = polls;
        self
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.base.join(CATALOG_FILE)
    }

    /// Installed solutions and their versions
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read.
    pub async fn installed(&self) -> Result<BTreeMap<String, SolutionVersion>, Error> {
        let _guard = self.lock.lock().await;
        let state = self.load().await?;
        Ok(state
            .solutions
            .into_iter()
            .map(|(name, solution)| (name, solution.version))
            .collect())
    }

    /// Record `unique_name` as installed without an import
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or written.
    pub async fn seed(&self, unique_name: &str, version: SolutionVersion) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        state.solutions.insert(
            unique_name.to_string(),
            InstalledSolution {
                version,
                installed_at: Utc::now(),
            },
        );
        self.save(&state).await
    }

    async fn load(&self) -> Result<CatalogState, Error> {
        let path = self.path();
        match fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CatalogState::default()),
            Err(e) => Err(Error::io_with_path(&e, path)),
        }
    }

    async fn save(&self, state: &CatalogState) -> Result<(), Error> {
        fs::create_dir_all(&self.base)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.base))?;
        let bytes = serde_json::to_vec_pretty(state)?;
        let path = self.path();
        let temp = self.base.join(format!("{CATALOG_FILE}.tmp"));
        fs::write(&temp, bytes)
            .await
            .map_err(|e| Error::io_with_path(&e, &temp))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        Ok(())
    }
}

/// Apply one import to the catalog state and return the success message
fn apply_import(
    state: &mut CatalogState,
    label: &str,
    package_bytes: &[u8],
    as_holding: bool,
) -> Result<String, RemoteError> {
    let manifest = read_manifest(Cursor::new(package_bytes), Path::new(label)).map_err(|e| {
        RemoteError::Fault {
            code: FAULT_INVALID_PACKAGE,
            message: e.to_string(),
        }
    })?;

    let name = if as_holding {
        if !state.solutions.contains_key(&manifest.unique_name) {
            return Err(RemoteError::Fault {
                code: FAULT_MISSING_BASE,
                message: format!(
                    "cannot stage {} as holding: base solution is not installed",
                    manifest.unique_name
                ),
            });
        }
        holding_name(&manifest.unique_name)
    } else {
        manifest.unique_name
    };

    state.solutions.insert(
        name.clone(),
        InstalledSolution {
            version: manifest.version,
            installed_at: Utc::now(),
        },
    );
    Ok(format!("imported {name} {}", manifest.version))
}

fn not_found(name: impl Into<String>) -> Error {
    RemoteError::NotFound { name: name.into() }.into()
}

#[async_trait::async_trait]
impl RemoteService for LocalCatalog {
    async fn resolve_installed_version(
        &self,
        unique_name: &str,
    ) -> Result<Option<SolutionVersion>, Error> {
        let _guard = self.lock.lock().await;
        let state = self.load().await?;
        Ok(state.solutions.get(unique_name).map(|s| s.version))
    }

    async fn import_sync(&self, request: &ImportRequest) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        let key = request.import_job_id.to_string();

        let result = apply_import(
            &mut state,
            &request.label,
            &request.package_bytes,
            request.as_holding,
        );
        let report = match &result {
            Ok(message) => RemoteImportResult::succeeded(key.clone(), message.clone()),
            Err(e) => RemoteImportResult {
                correlation_id: key.clone(),
                state: ImportResultState::Failed,
                message: e.to_string(),
                status_code: AsyncJobStatus::Failed.code(),
            },
        };
        state.reports.insert(key, report);
        self.save(&state).await?;

        tracing::debug!(label = %request.label, ok = result.is_ok(), "local catalog import");
        result.map(|_| ()).map_err(Into::into)
    }

    async fn import_async_submit(&self, request: &ImportRequest) -> Result<String, Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;

        // Reject unreadable uploads at submission like the real service
        read_manifest(Cursor::new(&request.package_bytes), Path::new(&request.label)).map_err(
            |e| RemoteError::Fault {
                code: FAULT_INVALID_PACKAGE,
                message: e.to_string(),
            },
        )?;

        let job_id = Uuid::new_v4().to_string();
        state.jobs.insert(
            job_id.clone(),
            AsyncJob {
                status: AsyncJobStatus::Waiting,
                message: "queued".to_string(),
                polls_remaining: self.async_polls,
                pending: Some(PendingImport {
                    import_job_id: request.import_job_id,
                    label: request.label.clone(),
                    package_bytes: request.package_bytes.clone(),
                    as_holding: request.as_holding,
                }),
            },
        );
        self.save(&state).await?;
        Ok(job_id)
    }

    async fn import_async_poll(&self, job_id: &str) -> Result<AsyncJobSnapshot, Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;

        let mut job = state.jobs.remove(job_id).ok_or_else(|| not_found(job_id))?;

        if job.polls_remaining > 0 {
            job.polls_remaining -= 1;
            job.status = AsyncJobStatus::InProgress;
            job.message = "importing".to_string();
        } else if let Some(pending) = job.pending.take() {
            let key = pending.import_job_id.to_string();
            match apply_import(
                &mut state,
                &pending.label,
                &pending.package_bytes,
                pending.as_holding,
            ) {
                Ok(message) => {
                    job.status = AsyncJobStatus::Succeeded;
                    state
                        .reports
                        .insert(key.clone(), RemoteImportResult::succeeded(key, message.clone()));
                    job.message = message;
                }
                Err(e) => {
                    job.status = AsyncJobStatus::Failed;
                    job.message = e.to_string();
                    state.reports.insert(
                        key.clone(),
                        RemoteImportResult {
                            correlation_id: key,
                            state: ImportResultState::Failed,
                            message: job.message.clone(),
                            status_code: AsyncJobStatus::Failed.code(),
                        },
                    );
                }
            }
        }

        let snapshot = AsyncJobSnapshot {
            job_id: job_id.to_string(),
            status: job.status,
            message: job.message.clone(),
        };
        state.jobs.insert(job_id.to_string(), job);
        self.save(&state).await?;
        Ok(snapshot)
    }

    async fn fetch_import_report(&self, import_job_id: Uuid) -> Result<RemoteImportResult, Error> {
        let _guard = self.lock.lock().await;
        let state = self.load().await?;
        let key = import_job_id.to_string();
        state.reports.get(&key).cloned().ok_or_else(|| not_found(key))
    }

    async fn promote(&self, unique_name: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;

        if !state.solutions.contains_key(unique_name) {
            return Err(RemoteError::Fault {
                code: FAULT_MISSING_BASE,
                message: format!("{unique_name} is not installed"),
            }
            .into());
        }
        let staged = state
            .solutions
            .remove(&holding_name(unique_name))
            .ok_or_else(|| RemoteError::Fault {
                code: FAULT_NO_HOLDING,
                message: format!("no holding package staged for {unique_name}"),
            })?;

        state.solutions.insert(unique_name.to_string(), staged);
        self.save(&state).await
    }

    async fn delete_by_name(&self, unique_name: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        if state.solutions.remove(unique_name).is_none() {
            return Err(not_found(unique_name));
        }
        self.save(&state).await
    }
}
