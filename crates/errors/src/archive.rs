//! Package archive error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("package archive is corrupt: {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("package manifest missing from {path}: expected entry {entry}")]
    MissingManifest { path: String, entry: String },

    #[error("invalid manifest field {field} in {path}: {value}")]
    InvalidManifestField {
        path: String,
        field: String,
        value: String,
    },

    #[error("failed to read package {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to repack holding copy {path}: {message}")]
    Repack { path: String, message: String },
}

impl ArchiveError {
    /// Build a corrupt-archive error from any displayable cause.
    #[must_use]
    pub fn corrupt(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Build an I/O error bound to a package path.
    #[must_use]
    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Corrupt { .. } | Self::MissingManifest { .. } => {
                Some("Re-export the solution package; the file is not a valid solution zip.")
            }
            Self::InvalidManifestField { .. } => {
                Some("Check UniqueName and Version inside solution.xml.")
            }
            Self::Io { .. } => Some("Ensure the package path exists and is readable."),
            Self::Repack { .. } => {
                Some("Ensure the package directory is writable and has free space.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Corrupt { .. } => "archive.corrupt",
            Self::MissingManifest { .. } => "archive.missing_manifest",
            Self::InvalidManifestField { .. } => "archive.invalid_manifest_field",
            Self::Io { .. } => "archive.io",
            Self::Repack { .. } => "archive.repack",
        };
        Some(code)
    }
}
