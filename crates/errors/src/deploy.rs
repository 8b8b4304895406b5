//! Deployment pipeline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DeployError {
    #[error("inconsistent state for {package}: {message}")]
    InconsistentState { package: String, message: String },

    #[error("package not installed: {package}")]
    NotFound { package: String },

    #[error("{phase} phase finished with {failed} failed package(s)")]
    PhaseFailed { phase: String, failed: usize },
}

impl UserFacingError for DeployError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InconsistentState { .. } => Some(
                "A previous run left a missing or mismatched holding package; re-run the holding phase.",
            ),
            Self::NotFound { .. } => None,
            Self::PhaseFailed { .. } => Some("See the per-package failures above."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InconsistentState { .. } => "deploy.inconsistent_state",
            Self::NotFound { .. } => "deploy.not_found",
            Self::PhaseFailed { .. } => "deploy.phase_failed",
        };
        Some(code)
    }
}
