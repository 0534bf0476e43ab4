//! CLI definitions for the trailhead deployment orchestrator.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "trailhead")]
#[command(
    author,
    version,
    about = "Deploy the Trail contract suite across EVM networks"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "TRAILHEAD_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the full suite: fee token, game, and collection.
    DeployAll(DeployArgs),
    /// Deploy the fee token and the game contract that depends on it.
    DeployGame(DeployArgs),
    /// Deploy the NFT collection only.
    DeployCollection(DeployArgs),
    /// List the registered network profiles.
    Networks(NetworksArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    /// Target network identifier (see `trailhead networks`).
    #[arg(short, long, env = "TRAILHEAD_NETWORK")]
    pub network: String,

    /// Path to the deployment configuration file.
    #[arg(
        long,
        alias = "conf",
        env = "TRAILHEAD_CONFIG",
        default_value = "config/deployment-config.json"
    )]
    pub config: PathBuf,

    /// Directory holding the compiled contract artifacts.
    #[arg(long, env = "TRAILHEAD_ARTIFACTS", default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Optional TOML file with network profile overrides, merged over the
    /// built-in table before environment variables apply.
    #[arg(long, env = "TRAILHEAD_NETWORKS_FILE")]
    pub networks_file: Option<PathBuf>,

    /// Deployer private key; the sender address is derived from it. Falls
    /// back to the node's first unlocked account when omitted.
    #[arg(long, env = "TRAILHEAD_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Run report from an earlier partial run; roles it records are reused
    /// instead of redeployed.
    #[arg(long, env = "TRAILHEAD_RESUME_FROM")]
    pub resume_from: Option<PathBuf>,

    /// Directory where run reports are written.
    #[arg(long, env = "TRAILHEAD_OUT", default_value = "deployments")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct NetworksArgs {
    /// Optional TOML file with network profile overrides.
    #[arg(long, env = "TRAILHEAD_NETWORKS_FILE")]
    pub networks_file: Option<PathBuf>,
}
