//! Command line interface definition

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use soldeploy_types::{DeployPhase, UpgradeStrategy};
use std::path::PathBuf;

/// soldeploy - staged deployment of versioned solution packages
#[derive(Parser)]
#[command(name = "soldeploy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Staged deployment of versioned solution packages")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write structured debug logs to the cache directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH", env = "SOLDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the identity of a package file
    Inspect {
        /// Path to the package file
        package: PathBuf,

        /// Also report what a local catalog has installed
        #[arg(long, value_name = "DIR")]
        catalog: Option<PathBuf>,
    },

    /// Write the renamed holding copy next to a package
    Stage {
        /// Path to the package file
        package: PathBuf,
    },

    /// Validate the configuration and print the deployment plan
    Validate,

    /// Run deployment phases against a local catalog
    Deploy {
        /// Phase to run
        #[arg(long, value_enum, default_value_t = PhaseArg::All)]
        phase: PhaseArg,

        /// Catalog directory standing in for the remote service
        #[arg(long, value_name = "DIR")]
        catalog: PathBuf,

        /// Upgrade API, overriding the configuration
        #[arg(long, value_enum)]
        upgrade_api: Option<UpgradeApiArg>,

        /// Disable holding packages for this run
        #[arg(long)]
        no_holding: bool,

        /// Keep going after a package fails; the phase still fails at the end
        #[arg(long)]
        continue_on_error: bool,

        /// Number of polls before a catalog async job completes
        #[arg(long, value_name = "N")]
        async_polls: Option<u32>,
    },
}

/// Phase selection for `deploy`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    Holding,
    Delete,
    Update,
    All,
}

impl PhaseArg {
    /// The single phase selected, `None` for all of them
    pub fn phase(self) -> Option<DeployPhase> {
        match self {
            Self::Holding => Some(DeployPhase::InstallHolding),
            Self::Delete => Some(DeployPhase::DeleteOriginal),
            Self::Update => Some(DeployPhase::InstallUpdated),
            Self::All => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UpgradeApiArg {
    Legacy,
    Promote,
}

impl From<UpgradeApiArg> for UpgradeStrategy {
    fn from(arg: UpgradeApiArg) -> Self {
        match arg {
            UpgradeApiArg::Legacy => Self::Legacy,
            UpgradeApiArg::Promote => Self::Promote,
        }
    }
}
