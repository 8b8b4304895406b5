//! Remote service error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("transport failure during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("request timed out during {operation}")]
    Timeout { operation: String },

    #[error("remote fault {code}: {message}")]
    Fault { code: i32, message: String },

    #[error("not found on remote: {name}")]
    NotFound { name: String },
}

impl UserFacingError for RemoteError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => {
                Some("Check connectivity to the remote service and retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Transport { .. } => "remote.transport",
            Self::Timeout { .. } => "remote.timeout",
            Self::Fault { .. } => "remote.fault",
            Self::NotFound { .. } => "remote.not_found",
        };
        Some(code)
    }
}
