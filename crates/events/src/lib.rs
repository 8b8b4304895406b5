#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for progress reporting in soldeploy
//!
//! Library crates never print. Everything a host needs to show or log about a
//! running deployment goes through this channel as an [`EventMessage`]:
//! phase boundaries, per-package start/finish, async poll ticks and
//! free-form progress lines. The core is single-threaded, so messages arrive
//! in emission order.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, DeployEvent, FailureContext, GeneralEvent};

use serde::{Deserialize, Serialize};
use soldeploy_types::SolutionVersion;
use tokio::sync::mpsc::UnboundedSender;

/// Event plus the metadata captured when it was emitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        if let AppEvent::Deploy(deploy) = &event {
            if let Some(package) = deploy.package() {
                meta = meta.with_correlation_id(package);
            }
        }
        Self { meta, event }
    }
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout soldeploy
///
/// Implemented for a raw `EventSender` and for anything that holds one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event with explicit metadata
    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        let EventMessage { meta, event } = EventMessage::from_event(event);
        self.emit_with_meta(meta, event);
    }

    /// Emit a deployment event
    fn emit_deploy(&self, event: DeployEvent) {
        self.emit(AppEvent::Deploy(event));
    }

    /// Emit a progress line for one package
    fn emit_package_progress(
        &self,
        package: impl Into<String>,
        version: SolutionVersion,
        message: impl Into<String>,
    ) {
        self.emit_deploy(DeployEvent::Progress {
            package: package.into(),
            version,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Implementation for optional senders so components can run without a host
impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
