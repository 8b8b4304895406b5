#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Remote operation driver
//!
//! [`ImportGateway`] runs imports against a [`RemoteService`], synchronously
//! or as a polled async job, and exposes the other remote primitives the
//! deployment pipeline needs. Every poll tick and state change is reported
//! on the event channel, which is how a host sees progress while a call
//! blocks.

mod subject;

pub use subject::ImportSubject;

use soldeploy_errors::{ArchiveError, DeployError, Error, ImportError, RemoteError};
use soldeploy_events::{DeployEvent, EventEmitter, EventSender};
use soldeploy_remote::{AsyncJobSnapshot, ImportRequest, RemoteService};
use soldeploy_types::{ImportOptions, RemoteImportResult, SolutionVersion};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Import bookkeeping of a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayState {
    Idle,
    /// An import has not returned yet. Holds the remote async job id once
    /// the job was submitted, the local import job id before that and for
    /// synchronous imports.
    ImportInFlight(String),
}

/// Drives imports and remote primitives over one logical remote session
pub struct ImportGateway {
    remote: Arc<dyn RemoteService>,
    state: GatewayState,
    events: Option<EventSender>,
}

impl std::fmt::Debug for ImportGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportGateway")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for ImportGateway {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl ImportGateway {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self {
            remote,
            state: GatewayState::Idle,
            events: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Forget an import whose future was dropped before it returned.
    ///
    /// Returns the job id that was in flight, if any.
    pub fn abandon_in_flight(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, GatewayState::Idle) {
            GatewayState::Idle => None,
            GatewayState::ImportInFlight(job_id) => Some(job_id),
        }
    }

    /// Installed version of `unique_name`; `None` means not installed.
    ///
    /// # Errors
    ///
    /// Propagates remote failures.
    pub async fn resolve_installed_version(
        &self,
        unique_name: &str,
    ) -> Result<Option<SolutionVersion>, Error> {
        let installed = self.remote.resolve_installed_version(unique_name).await?;
        self.emit_debug(match installed {
            Some(version) => format!("{unique_name} is installed at {version}"),
            None => format!("{unique_name} is not installed"),
        });
        Ok(installed)
    }

    /// Import a package file and return the remote completion report.
    ///
    /// With `wait_for_completion` unset the call returns the job's current
    /// status and releases the gateway; the remote job id is handed back as
    /// the result's `correlation_id` and following the job is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// - `ImportError::AlreadyInProgress` if another import has not returned
    /// - `ImportError::Failed` when the remote reports a fault or a failed,
    ///   canceled, canceling or pausing async job
    /// - `ImportError::TimedOut` when polling exceeds `options.timeout`
    /// - `RemoteError` transport failures, re-raised after the completion
    ///   report was looked up
    pub async fn import(
        &mut self,
        subject: &ImportSubject,
        options: &ImportOptions,
    ) -> Result<RemoteImportResult, Error> {
        if let GatewayState::ImportInFlight(job_id) = &self.state {
            return Err(ImportError::AlreadyInProgress {
                job_id: job_id.clone(),
            }
            .into());
        }

        let package_bytes = tokio::fs::read(&subject.path)
            .await
            .map_err(|e| ArchiveError::io(&subject.path, &e))?;

        let request = ImportRequest {
            import_job_id: Uuid::new_v4(),
            label: subject.unique_name.clone(),
            package_bytes,
            publish_workflows: options.publish_workflows,
            overwrite_unmanaged: options.overwrite_unmanaged,
            as_holding: options.as_holding,
        };

        self.state = GatewayState::ImportInFlight(request.import_job_id.to_string());
        let result = if options.use_async {
            self.import_async(subject, &request, options).await
        } else {
            self.import_sync(subject, &request).await
        };
        self.state = GatewayState::Idle;
        result
    }

    async fn import_sync(
        &self,
        subject: &ImportSubject,
        request: &ImportRequest,
    ) -> Result<RemoteImportResult, Error> {
        self.progress(subject, format!("importing {}", subject.path.display()));

        match self.remote.import_sync(request).await {
            Ok(()) => {
                let report = self.remote.fetch_import_report(request.import_job_id).await?;
                self.progress(subject, format!("import completed: {}", report.message));
                Ok(report)
            }
            Err(err) => {
                // The remote side may have finished despite the client-side error
                match self.remote.fetch_import_report(request.import_job_id).await {
                    Ok(report) => self.progress(
                        subject,
                        format!("import report after failure: {}", report.message),
                    ),
                    Err(report_err) => tracing::debug!(
                        package = %subject.unique_name,
                        error = %report_err,
                        "no import report available"
                    ),
                }
                Err(import_failure(subject, err))
            }
        }
    }

    async fn import_async(
        &mut self,
        subject: &ImportSubject,
        request: &ImportRequest,
        options: &ImportOptions,
    ) -> Result<RemoteImportResult, Error> {
        let job_id = self
            .remote
            .import_async_submit(request)
            .await
            .map_err(|e| import_failure(subject, e))?;
        self.state = GatewayState::ImportInFlight(job_id.clone());
        self.progress(subject, format!("submitted async import job {job_id}"));

        if !options.wait_for_completion {
            let snapshot = self.remote.import_async_poll(&job_id).await?;
            self.polled(subject, &snapshot, Duration::ZERO);
            return Ok(RemoteImportResult {
                correlation_id: job_id,
                state: snapshot.status.result_state(),
                message: snapshot.message,
                status_code: snapshot.status.code(),
            });
        }

        // Budget runs from the first poll, not from submission
        let started = Instant::now();
        loop {
            let snapshot = self.remote.import_async_poll(&job_id).await?;
            let elapsed = started.elapsed();
            self.polled(subject, &snapshot, elapsed);

            if snapshot.status.is_success() {
                let report = self.remote.fetch_import_report(request.import_job_id).await?;
                self.progress(subject, format!("import completed: {}", report.message));
                return Ok(report);
            }

            if snapshot.status.is_failure() {
                return Err(ImportError::Failed {
                    package: subject.unique_name.clone(),
                    status_code: snapshot.status.code(),
                    message: snapshot.message,
                }
                .into());
            }

            if elapsed >= options.timeout {
                return Err(ImportError::TimedOut {
                    package: subject.unique_name.clone(),
                    job_id,
                    elapsed_secs: elapsed.as_secs(),
                }
                .into());
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }

    /// Replace `unique_name` with its staged holding package.
    ///
    /// # Errors
    ///
    /// Propagates remote failures, including transport timeouts.
    pub async fn promote(&self, unique_name: &str) -> Result<(), Error> {
        tracing::debug!(package = unique_name, "promoting holding package");
        self.remote.promote(unique_name).await
    }

    /// Delete an installed package.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::NotFound` when nothing by that name is
    /// installed; other remote failures propagate unchanged.
    pub async fn delete_by_name(&self, unique_name: &str) -> Result<(), Error> {
        tracing::debug!(package = unique_name, "deleting package");
        match self.remote.delete_by_name(unique_name).await {
            Err(Error::Remote(RemoteError::NotFound { .. })) => {
                Err(DeployError::NotFound {
                    package: unique_name.to_string(),
                }
                .into())
            }
            other => other,
        }
    }

    fn progress(&self, subject: &ImportSubject, message: String) {
        self.emit_package_progress(&subject.unique_name, subject.version, message);
    }

    fn polled(&self, subject: &ImportSubject, snapshot: &AsyncJobSnapshot, elapsed: Duration) {
        self.emit_deploy(DeployEvent::ImportPolled {
            package: subject.unique_name.clone(),
            job_id: snapshot.job_id.clone(),
            status: snapshot.status,
            message: snapshot.message.clone(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        self.progress(
            subject,
            format!("async import {}: {}", snapshot.status, snapshot.message),
        );
    }
}

/// Remote faults during an import become `ImportError::Failed`, keeping the
/// remote code and message verbatim.
fn import_failure(subject: &ImportSubject, err: Error) -> Error {
    match err {
        Error::Remote(RemoteError::Fault { code, message }) => ImportError::Failed {
            package: subject.unique_name.clone(),
            status_code: code,
            message,
        }
        .into(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn subject() -> ImportSubject {
        ImportSubject {
            unique_name: "Core".to_string(),
            version: SolutionVersion::new(2, 0, 0),
            path: PathBuf::from("Core.zip"),
        }
    }

    #[test]
    fn test_fault_becomes_import_failed_verbatim() {
        let err = import_failure(
            &subject(),
            RemoteError::Fault {
                code: -2_147_188_720,
                message: "Solution manifest import: FAILURE".to_string(),
            }
            .into(),
        );
        match err {
            Error::Import(ImportError::Failed {
                status_code,
                message,
                ..
            }) => {
                assert_eq!(status_code, -2_147_188_720);
                assert_eq!(message, "Solution manifest import: FAILURE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_is_not_rewritten() {
        let err = import_failure(
            &subject(),
            RemoteError::Timeout {
                operation: "import".to_string(),
            }
            .into(),
        );
        assert!(err.is_remote_timeout());
    }
}
