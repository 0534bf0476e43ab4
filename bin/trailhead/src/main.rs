//! trailhead is a CLI for deploying the Trail contract suite (fee token,
//! game, NFT collection) across EVM networks from one declarative
//! configuration.

mod cli;

use std::path::Path;

use alloy_core::primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use serde::Deserialize;

use cli::{Cli, Command, DeployArgs, NetworksArgs};
use trailhead_deploy::{
    ArtifactStore, DeploymentConfig, DeploymentRecord, DeploymentScope, HttpChain,
    NetworkRegistry, Pipeline, PipelineState, RunContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::DeployAll(args) => run_deploy(args, DeploymentScope::All).await,
        Command::DeployGame(args) => run_deploy(args, DeploymentScope::Game).await,
        Command::DeployCollection(args) => run_deploy(args, DeploymentScope::Collection).await,
        Command::Networks(args) => list_networks(args),
    }
}

async fn run_deploy(args: DeployArgs, scope: DeploymentScope) -> Result<()> {
    let registry = NetworkRegistry::load(args.networks_file.as_deref())?;
    let profile = registry.resolve(&args.network)?.clone();

    // Config is validated in full before anything touches the chain.
    let config = DeploymentConfig::load(&args.config, &args.network)?;
    let artifacts = ArtifactStore::new(&args.artifacts);

    let from = args
        .private_key
        .as_deref()
        .map(parse_deployer_address)
        .transpose()?;
    let chain = HttpChain::connect(&profile, from).await?;

    tracing::info!(
        network = %profile.name,
        chain_id = profile.chain_id,
        scope = %scope,
        from = %chain.sender(),
        "Starting deployment run"
    );

    let ctx = RunContext {
        profile: &profile,
        config: &config,
        artifacts: &artifacts,
    };
    let mut pipeline = Pipeline::new(ctx, &chain, scope);
    if let Some(path) = &args.resume_from {
        pipeline = pipeline.with_prior_records(load_prior_records(path)?);
    }

    let report = pipeline.run().await;
    let report_path = report.save(&args.out)?;
    tracing::info!(
        state = %report.state,
        records = report.records.len(),
        path = %report_path.display(),
        "Run report written"
    );

    if report.state == PipelineState::Done {
        Ok(())
    } else {
        if let Some(abort) = &report.aborted_with {
            eprintln!("aborted: {} ({})", abort.kind, abort.message);
        }
        std::process::exit(1);
    }
}

/// Derive the sender address from the deployer private key.
fn parse_deployer_address(key: &str) -> Result<Address> {
    let signer: PrivateKeySigner = key
        .trim()
        .parse()
        .context("Invalid deployer private key")?;
    // alloy-signer-local and alloy-core pin different alloy-primitives
    // majors; bridge through the string form.
    signer
        .address()
        .to_string()
        .parse()
        .context("Failed to parse derived deployer address")
}

/// Pull the deployment records out of a previous run's report.
fn load_prior_records(path: &Path) -> Result<Vec<DeploymentRecord>> {
    #[derive(Deserialize)]
    struct PriorRun {
        records: Vec<DeploymentRecord>,
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prior run report {}", path.display()))?;
    let prior: PriorRun = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse prior run report {}", path.display()))?;
    Ok(prior.records)
}

fn list_networks(args: NetworksArgs) -> Result<()> {
    let registry = NetworkRegistry::load(args.networks_file.as_deref())?;

    let mut table = Table::new();
    table.set_header(["network", "chain id", "rpc", "confirmations", "explorer"]);
    for profile in registry.iter() {
        table.add_row([
            profile.name.clone(),
            profile.chain_id.to_string(),
            profile.rpc_url.clone(),
            profile.confirmation_depth.to_string(),
            profile
                .explorer
                .as_ref()
                .map(|e| e.api_url.clone())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}
