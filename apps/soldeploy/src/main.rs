//! soldeploy - staged deployment of versioned solution packages
//!
//! The CLI loads the deployment configuration, wires the progress channel and
//! drives the operations in the ops crate. A local catalog directory stands
//! in for the remote solution service.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs, PhaseArg};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::{ColorChoice, Parser};
use soldeploy_config::Config;
use soldeploy_events::{EventReceiver, EventSender};
use soldeploy_ops::{DeploymentPipeline, OperationResult};
use soldeploy_remote::{LocalCatalog, RemoteService};
use soldeploy_types::FailurePolicy;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting soldeploy v{}", env!("CARGO_PKG_VERSION"));

    // File, then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.command);

    let colors = colors_enabled(&cli.global);
    let renderer = OutputRenderer::new(cli.global.json, colors);
    let mut event_handler = EventHandler::new(colors, cli.global.debug, cli.global.json);

    let (event_sender, event_receiver) = soldeploy_events::channel();
    let result = execute_command_with_events(
        execute_command(cli.command, config, event_sender),
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;
    ensure_success(&result)?;

    info!("Command completed successfully");
    Ok(())
}

fn colors_enabled(global: &GlobalArgs) -> bool {
    match global.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    }
}

fn apply_cli_config(config: &mut Config, command: &Commands) {
    if let Commands::Deploy {
        upgrade_api,
        no_holding,
        continue_on_error,
        ..
    } = command
    {
        if let Some(api) = upgrade_api {
            config.pipeline.upgrade_api = (*api).into();
        }
        if *no_holding {
            config.pipeline.use_holding_packages = false;
        }
        if *continue_on_error {
            config.pipeline.failure_policy = FailurePolicy::Continue;
        }
    }
}

/// Drive the command while draining progress events
async fn execute_command_with_events(
    command: impl std::future::Future<Output = Result<OperationResult, CliError>>,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(command);

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    // Every sender is gone; only the command is left to wait for
                    None => return (&mut command_future).await,
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    events: EventSender,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Inspect { package, catalog } => {
            let catalog = catalog.map(LocalCatalog::new);
            let info = soldeploy_ops::inspect_package(
                &package,
                catalog.as_ref().map(|c| c as &dyn RemoteService),
                Some(&events),
            )
            .await?;
            Ok(OperationResult::PackageInfo(info))
        }

        Commands::Stage { package } => {
            let path = soldeploy_ops::stage_holding_copy(&package, Some(&events)).await?;
            Ok(OperationResult::HoldingStaged(path))
        }

        Commands::Validate => {
            let plan = config.validate()?;
            Ok(OperationResult::Plan(soldeploy_ops::plan_entries(&plan)))
        }

        Commands::Deploy {
            phase,
            catalog,
            async_polls,
            ..
        } => deploy(&config, phase, catalog, async_polls, events).await,
    }
}

async fn deploy(
    config: &Config,
    phase: PhaseArg,
    catalog: PathBuf,
    async_polls: Option<u32>,
    events: EventSender,
) -> Result<OperationResult, CliError> {
    let plan = config.validate()?;
    if plan.is_empty() {
        return Err(CliError::InvalidArguments(
            "no packages configured for deployment".to_string(),
        ));
    }

    let mut catalog = LocalCatalog::new(catalog);
    if let Some(polls) = async_polls {
        catalog = catalog.with_async_polls(polls);
    }
    info!(
        catalog = %catalog.path().display(),
        packages = plan.packages.len(),
        "deploying"
    );

    let mut pipeline =
        DeploymentPipeline::from_plan(Arc::new(catalog), &plan)?.with_event_sender(events);
    let result = match phase.phase() {
        Some(phase) => OperationResult::Phase(pipeline.run_phase(phase).await?),
        None => OperationResult::Deployment(pipeline.run_all().await?),
    };
    Ok(result)
}

/// Turn recorded package failures into a failing exit status
fn ensure_success(result: &OperationResult) -> Result<(), CliError> {
    match result {
        OperationResult::Phase(report) => report.ensure_success()?,
        OperationResult::Deployment(report) => {
            for phase in &report.phases {
                phase.ensure_success()?;
            }
        }
        OperationResult::PackageInfo(_)
        | OperationResult::HoldingStaged(_)
        | OperationResult::Plan(_) => {}
    }
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("soldeploy")
        .join("logs")
}

fn env_filter(default: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to a file, stdout stays clean
        let log_dir = log_dir();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Warning: Failed to create log directory: {e}");
        }

        let log_file = log_dir.join(format!(
            "soldeploy-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter("info,soldeploy=debug,soldeploy_ops=debug"))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(env_filter("info"))
                    .init();
            }
        }
    } else if json_mode {
        // Keep stdout parseable
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter("warn"))
            .without_time()
            .init();
    }
}
