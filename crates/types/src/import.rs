//! Remote import results, async job statuses and import options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal/non-terminal tag of a remote import outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportResultState {
    Pending,
    Succeeded,
    Failed,
}

impl ImportResultState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Outcome of one remote import attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImportResult {
    pub correlation_id: String,
    pub state: ImportResultState,
    pub message: String,
    pub status_code: i32,
}

impl RemoteImportResult {
    #[must_use]
    pub fn succeeded(correlation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            state: ImportResultState::Succeeded,
            message: message.into(),
            status_code: AsyncJobStatus::Succeeded.code(),
        }
    }
}

/// Status of a remote async job, using the remote service's numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncJobStatus {
    WaitingForResources,
    Waiting,
    InProgress,
    Pausing,
    Canceling,
    Succeeded,
    Failed,
    Canceled,
    Unknown(i32),
}

impl AsyncJobStatus {
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::WaitingForResources,
            10 => Self::Waiting,
            20 => Self::InProgress,
            21 => Self::Pausing,
            22 => Self::Canceling,
            30 => Self::Succeeded,
            31 => Self::Failed,
            32 => Self::Canceled,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::WaitingForResources => 0,
            Self::Waiting => 10,
            Self::InProgress => 20,
            Self::Pausing => 21,
            Self::Canceling => 22,
            Self::Succeeded => 30,
            Self::Failed => 31,
            Self::Canceled => 32,
            Self::Unknown(code) => code,
        }
    }

    /// Statuses that end a poll loop with a failure.
    ///
    /// Pausing and canceling are not terminal on the remote side but a job in
    /// either state will not deliver the import, so polling stops there.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Canceled | Self::Canceling | Self::Pausing
        )
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    #[must_use]
    pub fn result_state(self) -> ImportResultState {
        if self.is_success() {
            ImportResultState::Succeeded
        } else if self.is_failure() {
            ImportResultState::Failed
        } else {
            ImportResultState::Pending
        }
    }
}

impl fmt::Display for AsyncJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForResources => write!(f, "WaitingForResources"),
            Self::Waiting => write!(f, "Waiting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Pausing => write!(f, "Pausing"),
            Self::Canceling => write!(f, "Canceling"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Options for a single import call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub publish_workflows: bool,
    pub overwrite_unmanaged: bool,
    pub use_async: bool,
    pub wait_for_completion: bool,
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Ask the remote service to stage the import as a holding package
    pub as_holding: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            publish_workflows: true,
            overwrite_unmanaged: true,
            use_async: false,
            wait_for_completion: true,
            poll_interval: Duration::from_secs(15),
            timeout: Duration::from_secs(3600),
            as_holding: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_roundtrip() {
        for code in [0, 10, 20, 21, 22, 30, 31, 32, 99] {
            assert_eq!(AsyncJobStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(AsyncJobStatus::from_code(30).is_success());
        for code in [21, 22, 31, 32] {
            assert!(AsyncJobStatus::from_code(code).is_failure(), "code {code}");
        }
        for code in [0, 10, 20, 99] {
            let status = AsyncJobStatus::from_code(code);
            assert_eq!(status.result_state(), ImportResultState::Pending);
        }
    }

    #[test]
    fn test_result_state_serialization() {
        let json = serde_json::to_string(&ImportResultState::Succeeded).unwrap();
        assert_eq!(json, r#""succeeded""#);
    }
}
