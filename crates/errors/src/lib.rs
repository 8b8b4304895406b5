#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the soldeploy solution deployer
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can travel inside events and
//! phase reports.

use std::borrow::Cow;

use thiserror::Error;

pub mod archive;
pub mod config;
pub mod deploy;
pub mod import;
pub mod remote;

// Re-export all error types at the root
pub use archive::ArchiveError;
pub use config::ConfigError;
pub use deploy::DeployError;
pub use import::ImportError;
pub use remote::RemoteError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("import error: {0}")]
    Import(#[from] ImportError),

    #[error("deploy error: {0}")]
    Deploy(#[from] DeployError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Whether this error is a transport-level timeout talking to the remote
    /// service. Such operations may have completed remotely without an
    /// acknowledgement reaching us.
    #[must_use]
    pub fn is_remote_timeout(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Timeout { .. }))
    }

    /// Remote status code carried by this error, if any.
    #[must_use]
    pub fn remote_status_code(&self) -> Option<i32> {
        match self {
            Self::Import(ImportError::Failed { status_code, .. })
            | Self::Remote(RemoteError::Fault {
                code: status_code, ..
            }) => Some(*status_code),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for soldeploy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Archive(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Import(err) => err.user_message(),
            Error::Deploy(err) => err.user_message(),
            Error::Remote(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Archive(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Import(err) => err.user_hint(),
            Error::Deploy(err) => err.user_hint(),
            Error::Remote(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Import(err) => err.is_retryable(),
            Error::Remote(err) => err.is_retryable(),
            Error::Deploy(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Archive(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Import(err) => err.user_code(),
            Error::Deploy(err) => err.user_code(),
            Error::Remote(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
