#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Boundary to the remote solution service
//!
//! [`RemoteService`] is the request/response surface the deployer needs from
//! the remote side. The concrete transport lives outside this workspace;
//! [`LocalCatalog`] is a file-backed implementation for development and
//! tests.

mod local;

pub use local::{LocalCatalog, FAULT_INVALID_PACKAGE, FAULT_MISSING_BASE, FAULT_NO_HOLDING};

use serde::{Deserialize, Serialize};
use soldeploy_errors::Error;
use soldeploy_types::{AsyncJobStatus, RemoteImportResult, SolutionVersion};
use uuid::Uuid;

/// One import submitted to the remote service
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Identifier the completion report is filed under
    pub import_job_id: Uuid,
    /// Package the bytes were read from, for diagnostics only
    pub label: String,
    pub package_bytes: Vec<u8>,
    pub publish_workflows: bool,
    pub overwrite_unmanaged: bool,
    /// Stage as a remote-managed holding package
    pub as_holding: bool,
}

/// Status of an async import job at one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncJobSnapshot {
    pub job_id: String,
    pub status: AsyncJobStatus,
    pub message: String,
}

#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    /// Installed version of `unique_name`, `None` when not installed
    async fn resolve_installed_version(
        &self,
        unique_name: &str,
    ) -> Result<Option<SolutionVersion>, Error>;

    async fn import_sync(&self, request: &ImportRequest) -> Result<(), Error>;

    /// Submit an async import and return the async job id
    async fn import_async_submit(&self, request: &ImportRequest) -> Result<String, Error>;

    async fn import_async_poll(&self, job_id: &str) -> Result<AsyncJobSnapshot, Error>;

    async fn fetch_import_report(&self, import_job_id: Uuid) -> Result<RemoteImportResult, Error>;

    /// Replace `unique_name` with its staged holding package in one operation
    async fn promote(&self, unique_name: &str) -> Result<(), Error>;

    async fn delete_by_name(&self, unique_name: &str) -> Result<(), Error>;
}
