//! trailhead-deploy - deployment orchestration for the Trail contract suite.
//!
//! This crate deploys the `FeeToken` ERC20, the `Bandit` game contract that
//! consumes it, and the `NFT` collection across EVM networks from one
//! declarative configuration. A pipeline driver sequences the per-network
//! deployments, waits out chain-specific confirmation depths, injects
//! cross-contract addresses into constructor arguments, issues post-deploy
//! configuration transactions, and conditionally submits source verification
//! to block explorers.

use serde::{Deserialize, Serialize};

pub mod artifacts;
pub mod chain;
pub mod config;
pub mod configurator;
pub mod deployer;
pub mod error;
pub mod linker;
pub mod network;
pub mod pipeline;
mod rpc;
pub mod verifier;

pub use artifacts::{ArtifactStore, ContractArtifact};
pub use chain::{ChainBackend, HttpChain, PendingTx, TxInclusion};
pub use config::DeploymentConfig;
pub use configurator::{ActionKind, ActionReceipt, Configurator, PostDeployAction};
pub use deployer::{ContractDeployer, DeploymentRecord};
pub use error::DeployError;
pub use network::{ExplorerConfig, LOCAL_CHAIN_ID, NetworkProfile, NetworkRegistry};
pub use pipeline::{
    DeploymentScope, Pipeline, PipelineState, RunContext, RunReport,
};
pub use verifier::{VerificationOutcome, VerificationTrigger};

/// Logical identity of a contract within the deployment, distinct from its
/// on-chain address.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContractRole {
    /// The `FeeToken` ERC20.
    Token,
    /// The `Bandit` game contract; its constructor takes the token address.
    Game,
    /// The `NFT` collection.
    Collection,
}

impl ContractRole {
    /// Solidity contract name backing this role, matching the artifact file.
    pub fn contract_name(&self) -> &'static str {
        match self {
            ContractRole::Token => "FeeToken",
            ContractRole::Game => "Bandit",
            ContractRole::Collection => "NFT",
        }
    }

    /// Roles whose deployed address this role's constructor requires.
    pub fn dependencies(&self) -> &'static [ContractRole] {
        match self {
            ContractRole::Game => &[ContractRole::Token],
            ContractRole::Token | ContractRole::Collection => &[],
        }
    }
}
