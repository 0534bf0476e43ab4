//! Contract deployer: creation transactions and confirmation tracking.

use alloy_core::dyn_abi::DynSolValue;
use alloy_core::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};

use crate::ContractRole;
use crate::artifacts::{ArtifactStore, init_code};
use crate::chain::{ChainBackend, TxInclusion};
use crate::error::DeployError;
use crate::network::NetworkProfile;
use crate::rpc::POLL_INTERVAL;

/// Audit record of one successful contract deployment. Created exactly once
/// per (role, network) within a run and never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub role: ContractRole,
    pub network: String,
    pub address: Address,
    pub tx_hash: B256,
    pub block_confirmations: u64,
    pub deployed_at: DateTime<Utc>,
}

/// Deploys contracts for one network and waits out its confirmation depth.
pub struct ContractDeployer<'a, C> {
    chain: &'a C,
    profile: &'a NetworkProfile,
    artifacts: &'a ArtifactStore,
}

impl<'a, C: ChainBackend> ContractDeployer<'a, C> {
    pub fn new(chain: &'a C, profile: &'a NetworkProfile, artifacts: &'a ArtifactStore) -> Self {
        Self {
            chain,
            profile,
            artifacts,
        }
    }

    /// Deploy `role` with the given constructor arguments.
    ///
    /// Submits exactly one creation transaction, waits for the profile's
    /// confirmation depth, and returns the record. There is no internal
    /// retry: a failed deploy is the driver's to handle, so a flaky network
    /// can never produce duplicate contract instances from one call.
    pub async fn deploy(
        &self,
        role: ContractRole,
        args: &[DynSolValue],
    ) -> Result<DeploymentRecord, DeployError> {
        let artifact = self.artifacts.load(role)?;
        let code = init_code(&artifact, args);

        tracing::info!(
            role = %role,
            contract = %artifact.contract_name,
            network = %self.profile.name,
            "Submitting creation transaction"
        );

        let pending = self.chain.submit_deployment(code).await?;
        let what = format!("{} deployment", role);
        let confirmed = await_confirmations(
            self.chain,
            self.profile,
            pending.tx_hash,
            self.profile.confirmation_depth,
            &what,
        )
        .await?;

        let address = confirmed
            .inclusion
            .contract_address
            .filter(|a| !a.is_zero())
            .ok_or_else(|| {
                DeployError::NetworkUnavailable(format!(
                    "creation receipt for {} carries no contract address",
                    what
                ))
            })?;

        tracing::info!(
            role = %role,
            network = %self.profile.name,
            address = %address,
            confirmations = confirmed.confirmations,
            "Contract deployed"
        );

        Ok(DeploymentRecord {
            role,
            network: self.profile.name.clone(),
            address,
            tx_hash: pending.tx_hash,
            block_confirmations: confirmed.confirmations,
            deployed_at: Utc::now(),
        })
    }
}

/// A transaction that reached its required confirmation depth.
pub(crate) struct Confirmed {
    pub inclusion: TxInclusion,
    pub confirmations: u64,
}

/// Wait for `tx_hash` to be included and accrue `required` confirmations on
/// top of its inclusion block, bounded by the profile's wait window.
pub(crate) async fn await_confirmations<C: ChainBackend>(
    chain: &C,
    profile: &NetworkProfile,
    tx_hash: B256,
    required: u64,
    what: &str,
) -> Result<Confirmed, DeployError> {
    let window = profile.confirmation_timeout(required);
    let start = Instant::now();

    let timeout = |confirmed: u64| DeployError::ConfirmationTimeout {
        what: what.to_string(),
        waited_secs: window.as_secs(),
        confirmed,
        required,
    };

    // Inclusion first.
    let inclusion = loop {
        if let Some(inclusion) = chain.inclusion(tx_hash).await? {
            break inclusion;
        }
        if start.elapsed() >= window {
            return Err(timeout(0));
        }
        sleep(POLL_INTERVAL).await;
    };

    if !inclusion.succeeded {
        return Err(DeployError::DeploymentReverted {
            what: what.to_string(),
            tx_hash: Some(tx_hash),
        });
    }

    if required == 0 {
        return Ok(Confirmed {
            inclusion,
            confirmations: 0,
        });
    }

    // Then the depth on top of the inclusion block.
    let mut confirmations = 0;
    loop {
        let head = chain.block_number().await?;
        confirmations = confirmations.max(head.saturating_sub(inclusion.block_number));
        if confirmations >= required {
            break;
        }
        if start.elapsed() >= window {
            return Err(timeout(confirmations));
        }
        tracing::trace!(%what, confirmations, required, "Waiting for confirmations");
        sleep(POLL_INTERVAL).await;
    }

    Ok(Confirmed {
        inclusion,
        confirmations,
    })
}
