//! Event handling and progress display

use console::{Style, Term};
use soldeploy_events::{AppEvent, DeployEvent, EventMessage, GeneralEvent};

use crate::logging::log_event_with_tracing;

/// Renders progress events as status lines on stderr
pub struct EventHandler {
    term: Term,
    colors: bool,
    /// Show per-package start lines and poll ticks
    verbose: bool,
    /// Suppress terminal output entirely; events are still logged
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors,
            verbose,
            quiet,
        }
    }

    /// Handle one drained event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match message.event {
            AppEvent::Deploy(event) => self.handle_deploy(event),
            AppEvent::General(event) => self.handle_general(event),
        }
    }

    fn handle_deploy(&self, event: DeployEvent) {
        match event {
            DeployEvent::PhaseStarted { phase, packages } => {
                let header = format!("==> {phase} ({packages} packages)");
                self.show(&self.style(Style::new().bold()).apply_to(header).to_string());
            }
            DeployEvent::PhaseCompleted { phase, failed, .. } if failed > 0 => {
                self.show_error(&format!("{phase} finished with {failed} failed packages"));
            }
            DeployEvent::PhaseCompleted { .. } | DeployEvent::HoldingCopyRemoved { .. } => {}
            DeployEvent::PackageStarted {
                package, version, ..
            } => {
                if self.verbose {
                    self.show(&format!("  {package} {version}"));
                }
            }
            DeployEvent::PackageFinished {
                package,
                version,
                action,
                ..
            } => {
                let mark = self.style(Style::new().green()).apply_to("✔");
                self.show(&format!("  {mark} {package} {version}: {action}"));
            }
            DeployEvent::PackageFailed {
                package, failure, ..
            } => {
                self.show_error(&format!("  ✖ {package}: {}", failure.message));
                if let Some(hint) = failure.hint {
                    self.show(&format!("    hint: {hint}"));
                }
            }
            DeployEvent::Progress {
                package,
                version,
                message,
                ..
            } => {
                let dim = self.style(Style::new().dim());
                self.show(&format!("    {}", dim.apply_to(format!("{package} {version}: {message}"))));
            }
            DeployEvent::ImportPolled {
                package,
                status,
                elapsed_ms,
                ..
            } => {
                if self.verbose {
                    self.show(&format!(
                        "    {package}: {status} after {}s",
                        elapsed_ms / 1000
                    ));
                }
            }
            DeployEvent::HoldingCopyCreated { path, .. } => {
                if self.verbose {
                    self.show(&format!("    holding copy {}", path.display()));
                }
            }
        }
    }

    fn handle_general(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                let warn = self.style(Style::new().yellow()).apply_to("warning:");
                match context {
                    Some(context) => self.show(&format!("{warn} {message} ({context})")),
                    None => self.show(&format!("{warn} {message}")),
                }
            }
            GeneralEvent::DebugLog { message } => {
                if self.verbose {
                    self.show(&message);
                }
            }
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.colors {
            style
        } else {
            Style::new()
        }
    }

    fn show(&self, line: &str) {
        // A closed stderr is not worth failing the deployment over
        let _ = self.term.write_line(line);
    }

    fn show_error(&self, line: &str) {
        let styled = self.style(Style::new().red()).apply_to(line).to_string();
        self.show(&styled);
    }
}
