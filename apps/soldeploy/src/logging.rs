//! Structured logging integration for events
//!
//! Every event drained from the channel is forwarded to `tracing` with
//! structured fields, so a JSON log carries the same information the
//! terminal shows.

use soldeploy_events::{AppEvent, DeployEvent, EventMessage, GeneralEvent};
use tracing::{debug, error, info, warn};

/// Log an `EventMessage` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::General(event) => log_general(message, event),
        AppEvent::Deploy(event) => match event {
            DeployEvent::PhaseStarted { phase, packages } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    phase = %phase,
                    packages,
                    "Phase started"
                );
            }
            DeployEvent::PhaseCompleted {
                phase,
                processed,
                failed,
            } => {
                if *failed > 0 {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        phase = %phase,
                        processed,
                        failed,
                        "Phase completed with failures"
                    );
                } else {
                    info!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        phase = %phase,
                        processed,
                        "Phase completed"
                    );
                }
            }
            DeployEvent::PackageStarted {
                phase,
                package,
                version,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    phase = %phase,
                    package = %package,
                    version = %version,
                    "Package started"
                );
            }
            DeployEvent::PackageFinished {
                phase,
                package,
                version,
                action,
            } => {
                info!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    phase = %phase,
                    package = %package,
                    version = %version,
                    action = %action,
                    "Package finished"
                );
            }
            DeployEvent::PackageFailed {
                phase,
                package,
                version,
                failure,
            } => {
                error!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    phase = %phase,
                    package = %package,
                    version = ?version.map(|v| v.to_string()),
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    retryable = failure.retryable,
                    "Package failed"
                );
            }
            DeployEvent::Progress {
                package,
                version,
                message: text,
                ..
            } => {
                info!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    package = %package,
                    version = %version,
                    "{text}"
                );
            }
            DeployEvent::ImportPolled {
                package,
                job_id,
                status,
                message: text,
                elapsed_ms,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    package = %package,
                    job_id = %job_id,
                    status = %status,
                    status_code = status.code(),
                    elapsed_ms,
                    remote_message = %text,
                    "Import polled"
                );
            }
            DeployEvent::HoldingCopyCreated { package, path }
            | DeployEvent::HoldingCopyRemoved { package, path } => {
                debug!(
                    source = meta.source.as_str(),
                    package = %package,
                    path = %path.display(),
                    created = matches!(event, DeployEvent::HoldingCopyCreated { .. }),
                    "Holding copy"
                );
            }
        },
    }
}

fn log_general(message: &EventMessage, event: &GeneralEvent) {
    let meta = &message.meta;
    match event {
        GeneralEvent::Warning {
            message: text,
            context,
        } => {
            warn!(
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                context = ?context,
                "{text}"
            );
        }
        GeneralEvent::DebugLog { message: text } => {
            debug!(source = meta.source.as_str(), "{text}");
        }
    }
}
