use serde::{Deserialize, Serialize};

/// Events not tied to a deployment phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Something worked out but deserves the operator's attention
    Warning {
        message: String,
        context: Option<String>,
    },

    /// Diagnostic detail, shown only in verbose output
    DebugLog { message: String },
}

impl GeneralEvent {
    #[must_use]
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    #[must_use]
    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }
}
