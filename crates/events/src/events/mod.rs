use serde::{Deserialize, Serialize};

use crate::EventSource;
use soldeploy_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code from the error taxonomy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message
    pub message: String,
    /// Optional remediation hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod deploy;
pub mod general;

pub use deploy::*;
pub use general::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings and debug detail
    General(GeneralEvent),

    /// Deployment events (phases, packages, imports)
    Deploy(DeployEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Deploy(
                DeployEvent::HoldingCopyCreated { .. } | DeployEvent::HoldingCopyRemoved { .. },
            ) => EventSource::ARCHIVE,
            Self::Deploy(DeployEvent::ImportPolled { .. }) => EventSource::GATEWAY,
            Self::Deploy(_) => EventSource::PIPELINE,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Deploy(DeployEvent::PackageFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. }) => Level::WARN,

            Self::Deploy(DeployEvent::PhaseCompleted { failed, .. }) if *failed > 0 => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Deploy(
                DeployEvent::ImportPolled { .. }
                | DeployEvent::HoldingCopyCreated { .. }
                | DeployEvent::HoldingCopyRemoved { .. },
            ) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "soldeploy::events::general",
            Self::Deploy(_) => "soldeploy::events::deploy",
        }
    }
}
