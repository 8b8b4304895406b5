//! The three-phase deployment pipeline
//!
//! Packages are processed strictly one after another. The delete phase walks
//! them in reverse install order so dependents are removed before the
//! packages they depend on.

use soldeploy_archive::PackageArchive;
use soldeploy_config::{check_pipeline_settings, DeploymentPlan};
use soldeploy_errors::{ConfigError, DeployError, Error, ImportError};
use soldeploy_events::{DeployEvent, EventEmitter, EventSender, FailureContext};
use soldeploy_gateway::{ImportGateway, ImportSubject};
use soldeploy_remote::RemoteService;
use soldeploy_types::{
    DeployPhase, FailurePolicy, ImportOptions, ImportSettings, PackageDescriptor,
    PackageStrategy, PipelineSettings, RemoteImportResult, SolutionVersion,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::benign::is_benign_holding_failure;
use crate::decision::{
    DeleteDecision, HoldingDecision, PackageUpgradeDecision, RemoteState, UpdateDecision,
};
use crate::types::{DeploymentReport, PackageAction, PackageOutcome, PhaseReport};

/// A package together with its settings and resolved upgrade strategy
#[derive(Debug)]
pub struct PipelinePackage {
    pub archive: PackageArchive,
    pub settings: ImportSettings,
    pub strategy: PackageStrategy,
}

/// Orchestrates the install-holding, delete-original and install-updated
/// phases over an ordered list of packages
#[derive(Debug)]
pub struct DeploymentPipeline {
    gateway: ImportGateway,
    settings: PipelineSettings,
    packages: Vec<PipelinePackage>,
    events: Option<EventSender>,
}

impl EventEmitter for DeploymentPipeline {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl DeploymentPipeline {
    /// Empty pipeline over `remote`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the polling settings would spin or time
    /// out before the first interval elapses.
    pub fn new(
        remote: Arc<dyn RemoteService>,
        settings: PipelineSettings,
    ) -> Result<Self, Error> {
        check_pipeline_settings(&settings)?;
        Ok(Self {
            gateway: ImportGateway::new(remote),
            settings,
            packages: Vec::new(),
            events: None,
        })
    }

    /// Pipeline for a plan, packages already in install order
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_plan(
        remote: Arc<dyn RemoteService>,
        plan: &DeploymentPlan,
    ) -> Result<Self, Error> {
        let mut pipeline = Self::new(remote, plan.settings)?;
        for planned in &plan.packages {
            pipeline.packages.push(PipelinePackage {
                archive: PackageArchive::new(&planned.path)
                    .with_force_upgrade(planned.strategy.force_upgrade()),
                settings: planned.settings,
                strategy: planned.strategy,
            });
        }
        Ok(pipeline)
    }

    /// Attach the progress channel to the pipeline, its gateway and every
    /// package added so far or later.
    #[must_use]
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.gateway = self.gateway.with_event_sender(events.clone());
        self.packages = self
            .packages
            .into_iter()
            .map(|p| PipelinePackage {
                archive: p.archive.with_event_sender(events.clone()),
                ..p
            })
            .collect();
        self.events = Some(events);
        self
    }

    /// Append a package after those already added.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Incompatible` when the package asks for a
    /// forced upgrade under the promote upgrade API.
    pub fn add_package(
        &mut self,
        path: impl Into<PathBuf>,
        settings: ImportSettings,
    ) -> Result<(), Error> {
        let path = path.into();
        let strategy = PackageStrategy::resolve(self.settings.upgrade_strategy, settings.force_upgrade)
            .ok_or_else(|| ConfigError::Incompatible {
                package: path.display().to_string(),
                reason: "force_upgrade requires file-based holding packages".to_string(),
            })?;

        let mut archive = PackageArchive::new(path).with_force_upgrade(strategy.force_upgrade());
        if let Some(events) = &self.events {
            archive = archive.with_event_sender(events.clone());
        }
        self.packages.push(PipelinePackage {
            archive,
            settings,
            strategy,
        });
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn packages(&self) -> &[PipelinePackage] {
        &self.packages
    }

    /// Phase 1: stage holding packages in install order.
    ///
    /// # Errors
    ///
    /// Under the fail-fast policy the first package failure other than an
    /// unreadable archive aborts the phase and is returned unchanged.
    pub async fn install_holding_packages(&mut self) -> Result<PhaseReport, Error> {
        self.run_phase(DeployPhase::InstallHolding).await
    }

    /// Phase 2: remove or promote originals in reverse install order.
    ///
    /// # Errors
    ///
    /// See [`Self::install_holding_packages`].
    pub async fn delete_original_packages(&mut self) -> Result<PhaseReport, Error> {
        self.run_phase(DeployPhase::DeleteOriginal).await
    }

    /// Phase 3: import final versions in install order and drop leftover
    /// holding packages.
    ///
    /// # Errors
    ///
    /// See [`Self::install_holding_packages`].
    pub async fn install_updated_packages(&mut self) -> Result<PhaseReport, Error> {
        self.run_phase(DeployPhase::InstallUpdated).await
    }

    /// Run the three phases in order.
    ///
    /// # Errors
    ///
    /// Returns the first error a phase aborts with.
    pub async fn run_all(&mut self) -> Result<DeploymentReport, Error> {
        let mut report = DeploymentReport::default();
        for phase in DeployPhase::ALL {
            report.phases.push(self.run_phase(phase).await?);
        }
        Ok(report)
    }

    /// Run one phase over every package.
    ///
    /// # Errors
    ///
    /// See [`Self::install_holding_packages`].
    pub async fn run_phase(&mut self, phase: DeployPhase) -> Result<PhaseReport, Error> {
        let start = Instant::now();
        let mut report = PhaseReport::new(phase);

        self.emit_deploy(DeployEvent::PhaseStarted {
            phase,
            packages: self.packages.len(),
        });

        let mut order: Vec<usize> = (0..self.packages.len()).collect();
        if phase.is_reversed() {
            order.reverse();
        }

        for index in order {
            match self.run_package(phase, index, &mut report).await {
                Ok(()) => {}
                Err((package, version, err)) => {
                    let failure = FailureContext::from_error(&err);
                    tracing::warn!(
                        phase = %phase,
                        package = %package,
                        error = %err,
                        "package failed"
                    );
                    self.emit_deploy(DeployEvent::PackageFailed {
                        phase,
                        package: package.clone(),
                        version,
                        failure: failure.clone(),
                    });
                    report.outcomes.push(PackageOutcome {
                        package,
                        version,
                        action: PackageAction::Failed { failure },
                        detail: None,
                    });

                    let continue_phase = matches!(err, Error::Archive(_))
                        || self.settings.failure_policy == FailurePolicy::Continue;
                    if !continue_phase {
                        self.emit_deploy(DeployEvent::PhaseCompleted {
                            phase,
                            processed: report.outcomes.len(),
                            failed: report.failed(),
                        });
                        return Err(err);
                    }
                }
            }
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.emit_deploy(DeployEvent::PhaseCompleted {
            phase,
            processed: report.outcomes.len(),
            failed: report.failed(),
        });
        Ok(report)
    }

    async fn run_package(
        &mut self,
        phase: DeployPhase,
        index: usize,
        report: &mut PhaseReport,
    ) -> Result<(), (String, Option<SolutionVersion>, Error)> {
        let descriptor = match self.packages[index].archive.describe().await {
            Ok(descriptor) => descriptor.clone(),
            Err(err) => {
                let label = self.packages[index].archive.path().display().to_string();
                return Err((label, None, err));
            }
        };
        let package = &self.packages[index];
        let decision = PackageUpgradeDecision::new(
            descriptor.version,
            package.strategy,
            package.settings.delete_only,
            &self.settings,
        );
        let settings = package.settings;

        self.emit_deploy(DeployEvent::PackageStarted {
            phase,
            package: descriptor.unique_name.clone(),
            version: descriptor.version,
        });

        let result = match phase {
            DeployPhase::InstallHolding => {
                self.install_holding(index, &descriptor, &decision, settings)
                    .await
            }
            DeployPhase::DeleteOriginal => self.delete_original(&descriptor, &decision).await,
            DeployPhase::InstallUpdated => {
                self.install_updated(index, &descriptor, &decision, settings)
                    .await
            }
        };

        let outcomes =
            result.map_err(|err| (descriptor.unique_name.clone(), Some(descriptor.version), err))?;
        for outcome in outcomes {
            self.emit_deploy(DeployEvent::PackageFinished {
                phase,
                package: outcome.package.clone(),
                version: descriptor.version,
                action: outcome.action.to_string(),
            });
            report.outcomes.push(outcome);
        }
        Ok(())
    }

    async fn remote_state(&self, descriptor: &PackageDescriptor) -> Result<RemoteState, Error> {
        Ok(RemoteState {
            installed: self
                .gateway
                .resolve_installed_version(&descriptor.unique_name)
                .await?,
            holding: self
                .gateway
                .resolve_installed_version(&descriptor.holding_name)
                .await?,
        })
    }

    fn import_options(&self, settings: ImportSettings, use_async: bool) -> ImportOptions {
        ImportOptions {
            publish_workflows: settings.publish_workflows,
            overwrite_unmanaged: settings.overwrite_unmanaged,
            use_async: use_async && settings.use_async,
            wait_for_completion: true,
            poll_interval: self.settings.poll_interval,
            timeout: self.settings.async_timeout,
            as_holding: false,
        }
    }

    async fn install_holding(
        &mut self,
        index: usize,
        descriptor: &PackageDescriptor,
        decision: &PackageUpgradeDecision,
        settings: ImportSettings,
    ) -> Result<Vec<PackageOutcome>, Error> {
        let choice = match decision.holding_precheck() {
            Some(reason) => HoldingDecision::Skip(reason),
            None => decision.holding(self.remote_state(descriptor).await?),
        };

        let (name, action, result) = match choice {
            HoldingDecision::Skip(reason) => {
                return Ok(vec![outcome(
                    &descriptor.unique_name,
                    descriptor.version,
                    PackageAction::skipped(reason),
                    None,
                )]);
            }
            HoldingDecision::ImportOriginal => {
                self.progress(descriptor, "not installed, importing original package");
                let options = self.import_options(settings, self.settings.async_import);
                let result = self
                    .gateway
                    .import(&ImportSubject::original(descriptor), &options)
                    .await?;
                (&descriptor.unique_name, PackageAction::Imported, result)
            }
            HoldingDecision::StageLegacyCopy => {
                let options = self.import_options(settings, self.settings.async_upgrade);
                // Dropping the guard removes the holding file on every path
                let copy = self.packages[index].archive.materialize_holding_copy().await?;
                let subject = ImportSubject {
                    path: copy.path().to_path_buf(),
                    ..ImportSubject::holding(descriptor)
                };
                let result = self.gateway.import(&subject, &options).await;
                drop(copy);
                (&descriptor.holding_name, PackageAction::ImportedHolding, result?)
            }
            HoldingDecision::StageRemoteHolding => {
                let options = ImportOptions {
                    as_holding: true,
                    ..self.import_options(settings, self.settings.async_upgrade)
                };
                let result = self.stage_remote_holding(descriptor, &options).await?;
                (&descriptor.holding_name, PackageAction::ImportedHolding, result)
            }
        };

        Ok(vec![outcome(
            name,
            descriptor.version,
            action,
            Some(result.message),
        )])
    }

    async fn stage_remote_holding(
        &mut self,
        descriptor: &PackageDescriptor,
        options: &ImportOptions,
    ) -> Result<RemoteImportResult, Error> {
        match self
            .gateway
            .import(&ImportSubject::original(descriptor), options)
            .await
        {
            Err(Error::Import(ImportError::Failed {
                status_code,
                message,
                ..
            })) if is_benign_holding_failure(&descriptor.unique_name, &message) => {
                tracing::warn!(
                    package = %descriptor.unique_name,
                    status_code,
                    message = %message,
                    "accepting known remote failure for holding import"
                );
                self.emit_warning_with_context(
                    format!(
                        "{}: accepted known remote failure as success",
                        descriptor.unique_name
                    ),
                    message.clone(),
                );
                Ok(RemoteImportResult::succeeded(
                    descriptor.holding_name.clone(),
                    format!("synthetic success after known failure: {message}"),
                ))
            }
            other => other,
        }
    }

    async fn delete_original(
        &mut self,
        descriptor: &PackageDescriptor,
        decision: &PackageUpgradeDecision,
    ) -> Result<Vec<PackageOutcome>, Error> {
        let choice = match decision.delete_precheck() {
            Some(reason) => DeleteDecision::Skip(reason),
            None => decision.delete(self.remote_state(descriptor).await?),
        };

        let name = &descriptor.unique_name;
        let (result, action) = match choice {
            DeleteDecision::Skip(reason) => {
                return Ok(vec![outcome(
                    name,
                    descriptor.version,
                    PackageAction::skipped(reason),
                    None,
                )]);
            }
            DeleteDecision::Inconsistent(message) => {
                return Err(DeployError::InconsistentState {
                    package: name.clone(),
                    message,
                }
                .into());
            }
            DeleteDecision::Delete => {
                self.progress(descriptor, "deleting original package");
                (self.gateway.delete_by_name(name).await, PackageAction::Deleted)
            }
            DeleteDecision::Promote => {
                self.progress(descriptor, "promoting holding package");
                (self.gateway.promote(name).await, PackageAction::Promoted)
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_remote_timeout() => {
                // The operation may have completed without an acknowledgement
                let installed = self.gateway.resolve_installed_version(name).await?;
                let completed = match action {
                    PackageAction::Promoted => installed == Some(descriptor.version),
                    _ => installed.is_none(),
                };
                if !completed {
                    return Err(err);
                }
                self.emit_warning_with_context(
                    format!("{name}: remote operation completed despite timeout"),
                    err.to_string(),
                );
            }
            Err(err) => return Err(err),
        }

        Ok(vec![outcome(name, descriptor.version, action, None)])
    }

    async fn install_updated(
        &mut self,
        index: usize,
        descriptor: &PackageDescriptor,
        decision: &PackageUpgradeDecision,
        settings: ImportSettings,
    ) -> Result<Vec<PackageOutcome>, Error> {
        // Leftover holding files from an interrupted run
        self.packages[index].archive.delete_holding_copy().await;

        let choice = if decision.delete_only {
            decision.update(None)
        } else {
            let installed = self
                .gateway
                .resolve_installed_version(&descriptor.unique_name)
                .await?;
            decision.update(installed)
        };

        let cleanup_holding = match choice {
            UpdateDecision::Skip(reason) => {
                return Ok(vec![outcome(
                    &descriptor.unique_name,
                    descriptor.version,
                    PackageAction::skipped(reason),
                    None,
                )]);
            }
            UpdateDecision::SkipAndClearHolding(reason) => {
                let mut outcomes = vec![outcome(
                    &descriptor.unique_name,
                    descriptor.version,
                    PackageAction::skipped(reason),
                    None,
                )];
                outcomes.extend(self.delete_remote_holding(descriptor).await?);
                return Ok(outcomes);
            }
            UpdateDecision::Import { cleanup_holding } => cleanup_holding,
        };

        let options = self.import_options(settings, self.settings.async_import);
        let result = self
            .gateway
            .import(&ImportSubject::original(descriptor), &options)
            .await?;
        let mut outcomes = vec![outcome(
            &descriptor.unique_name,
            descriptor.version,
            PackageAction::Imported,
            Some(result.message),
        )];

        if cleanup_holding {
            outcomes.extend(self.delete_remote_holding(descriptor).await?);
        }

        Ok(outcomes)
    }

    /// Remove the remote holding package if one is installed
    async fn delete_remote_holding(
        &self,
        descriptor: &PackageDescriptor,
    ) -> Result<Option<PackageOutcome>, Error> {
        if self
            .gateway
            .resolve_installed_version(&descriptor.holding_name)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        self.progress(descriptor, "deleting holding package");
        self.gateway.delete_by_name(&descriptor.holding_name).await?;
        Ok(Some(outcome(
            &descriptor.holding_name,
            descriptor.version,
            PackageAction::HoldingDeleted,
            None,
        )))
    }

    fn progress(&self, descriptor: &PackageDescriptor, message: &str) {
        self.emit_package_progress(&descriptor.unique_name, descriptor.version, message);
    }
}

fn outcome(
    package: &str,
    version: SolutionVersion,
    action: PackageAction,
    detail: Option<String>,
) -> PackageOutcome {
    PackageOutcome {
        package: package.to_string(),
        version: Some(version),
        action,
        detail,
    }
}
