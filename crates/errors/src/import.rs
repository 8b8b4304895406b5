//! Remote import error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("an import is already in progress (job {job_id})")]
    AlreadyInProgress { job_id: String },

    #[error("import of {package} failed with status {status_code}: {message}")]
    Failed {
        package: String,
        status_code: i32,
        message: String,
    },

    #[error("import of {package} timed out after {elapsed_secs}s (job {job_id})")]
    TimedOut {
        package: String,
        job_id: String,
        elapsed_secs: u64,
    },
}

impl UserFacingError for ImportError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::AlreadyInProgress { .. } => {
                Some("Imports run one at a time; wait for the running job to finish.")
            }
            Self::Failed { .. } => Some("Inspect the import log on the remote service."),
            Self::TimedOut { .. } => Some(
                "The job may still complete remotely; check its status, then re-run the deployment.",
            ),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::AlreadyInProgress { .. } => "import.already_in_progress",
            Self::Failed { .. } => "import.failed",
            Self::TimedOut { .. } => "import.timed_out",
        };
        Some(code)
    }
}
