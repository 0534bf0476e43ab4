//! Post-deployment configuration transactions.
//!
//! Each action is a single transaction with its own confirmation wait. The
//! configurator never loops or batches: minting three units is three driver
//! invocations, so a failure after two leaves two confirmed, recorded mints
//! behind rather than one opaque half-done batch.

use alloy_core::dyn_abi::DynSolValue;
use alloy_core::primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

use crate::ContractRole;
use crate::artifacts::encode_call;
use crate::chain::ChainBackend;
use crate::deployer::{DeploymentRecord, await_confirmations};
use crate::error::DeployError;
use crate::network::NetworkProfile;

/// What a post-deploy action does to its target contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Point the collection at its metadata root: `setBaseURI(string)`.
    ConfigureMetadata { base_uri: String },
    /// Mint one unit to an address: `safeMint(address)`.
    Mint { to: Address },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::ConfigureMetadata { .. } => "configure-metadata",
            ActionKind::Mint { .. } => "mint",
        }
    }

    /// ABI call data for this action.
    pub fn calldata(&self) -> Bytes {
        match self {
            ActionKind::ConfigureMetadata { base_uri } => encode_call(
                "setBaseURI(string)",
                &[DynSolValue::String(base_uri.clone())],
            ),
            ActionKind::Mint { to } => encode_call("safeMint(address)", &[DynSolValue::Address(*to)]),
        }
    }
}

/// A single follow-up transaction against a deployed contract. Ordering is a
/// strict dependency: an action cannot run before its target's deployment
/// record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDeployAction {
    pub target: ContractRole,
    pub kind: ActionKind,
    pub confirmations_required: u64,
}

/// Confirmed outcome of one post-deploy action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub target: ContractRole,
    #[serde(flatten)]
    pub kind: ActionKind,
    pub tx_hash: B256,
    pub block_confirmations: u64,
}

/// Issues post-deploy transactions and waits out their confirmations.
pub struct Configurator<'a, C> {
    chain: &'a C,
    profile: &'a NetworkProfile,
}

impl<'a, C: ChainBackend> Configurator<'a, C> {
    pub fn new(chain: &'a C, profile: &'a NetworkProfile) -> Self {
        Self { chain, profile }
    }

    /// Submit one configuration transaction against the target's recorded
    /// address and wait for the action's required confirmations.
    pub async fn apply(
        &self,
        action: &PostDeployAction,
        record: &DeploymentRecord,
    ) -> Result<ActionReceipt, DeployError> {
        let what = format!("{} on {}", action.kind.label(), action.target);

        tracing::info!(
            action = action.kind.label(),
            target = %action.target,
            address = %record.address,
            network = %self.profile.name,
            "Submitting configuration transaction"
        );

        let pending = self
            .chain
            .submit_call(record.address, action.kind.calldata())
            .await?;
        let confirmed = await_confirmations(
            self.chain,
            self.profile,
            pending.tx_hash,
            action.confirmations_required,
            &what,
        )
        .await?;

        tracing::info!(
            action = action.kind.label(),
            target = %action.target,
            confirmations = confirmed.confirmations,
            "Configuration transaction confirmed"
        );

        Ok(ActionReceipt {
            target: action.target,
            kind: action.kind.clone(),
            tx_hash: pending.tx_hash,
            block_confirmations: confirmed.confirmations,
        })
    }
}
