//! Transaction submission backend.
//!
//! The pipeline treats the chain as an opaque collaborator behind
//! [`ChainBackend`]: submit a creation or call transaction, look up its
//! inclusion, read the head block number. Ordering, confirmation waits, and
//! failure semantics all live above this seam, so tests drive the pipeline
//! with an in-process backend and production uses [`HttpChain`].

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes};
use serde_json::Value;
use url::Url;

use crate::error::DeployError;
use crate::network::NetworkProfile;
use crate::rpc;

/// Gas limit attached to creation transactions. Unused gas is refunded; an
/// explicit limit keeps node-side estimation failures out of the submission
/// path so reverts surface in the receipt.
const DEPLOY_GAS: &str = "0x7a1200";

/// Gas limit attached to configuration calls.
const CALL_GAS: &str = "0x100000";

/// Handle to a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: B256,
}

/// Inclusion data for a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInclusion {
    pub tx_hash: B256,
    pub block_number: u64,
    pub succeeded: bool,
    /// Set for creation transactions only.
    pub contract_address: Option<Address>,
}

/// Transaction submission service.
///
/// Implementations submit exactly one transaction per submit call and never
/// retry internally; a failed submission is the caller's decision to handle.
pub trait ChainBackend {
    /// Submit a contract-creation transaction.
    fn submit_deployment(
        &self,
        init_code: Bytes,
    ) -> impl Future<Output = Result<PendingTx, DeployError>> + Send;

    /// Submit a call transaction against a deployed contract.
    fn submit_call(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<PendingTx, DeployError>> + Send;

    /// Inclusion data for a transaction, `None` while it is still pending.
    fn inclusion(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Option<TxInclusion>, DeployError>> + Send;

    /// Latest block number.
    fn block_number(&self) -> impl Future<Output = Result<u64, DeployError>> + Send;
}

/// JSON-RPC chain backend. Transactions are signed by the node
/// (`eth_sendTransaction`); the deployer account must be unlocked there.
pub struct HttpChain {
    client: reqwest::Client,
    url: Url,
    from: Address,
}

impl HttpChain {
    /// Connect to the profile's RPC endpoint, check that the node's chain id
    /// matches the profile, and pick the sender account: `from` if given,
    /// otherwise the node's first unlocked account.
    pub async fn connect(
        profile: &NetworkProfile,
        from: Option<Address>,
    ) -> Result<Self, DeployError> {
        let url = Url::parse(&profile.rpc_url).map_err(|e| {
            DeployError::NetworkUnavailable(format!("rpc url '{}': {}", profile.rpc_url, e))
        })?;
        let client = rpc::create_client()?;

        let chain_id_hex: String =
            rpc::json_rpc_call(&client, url.as_str(), "eth_chainId", vec![]).await?;
        let chain_id = rpc::parse_hex_u64(&chain_id_hex, "eth_chainId")?;
        if chain_id != profile.chain_id {
            return Err(DeployError::NetworkUnavailable(format!(
                "chain id mismatch: profile '{}' expects {}, node reports {}",
                profile.name, profile.chain_id, chain_id
            )));
        }

        let from = match from {
            Some(address) => address,
            None => {
                let accounts: Vec<Address> =
                    rpc::json_rpc_call(&client, url.as_str(), "eth_accounts", vec![]).await?;
                accounts.first().copied().ok_or_else(|| {
                    DeployError::NetworkUnavailable(
                        "node exposes no unlocked accounts and no deployer key was given"
                            .to_string(),
                    )
                })?
            }
        };

        tracing::debug!(
            network = %profile.name,
            chain_id,
            from = %from,
            "Connected to RPC endpoint"
        );

        Ok(Self { client, url, from })
    }

    /// The account transactions are sent from.
    pub fn sender(&self) -> Address {
        self.from
    }

    async fn send_transaction(&self, tx: Value) -> Result<PendingTx, DeployError> {
        let tx_hash: String = rpc::json_rpc_call(
            &self.client,
            self.url.as_str(),
            "eth_sendTransaction",
            vec![tx],
        )
        .await?;
        let tx_hash: B256 = tx_hash.parse().map_err(|e| {
            DeployError::NetworkUnavailable(format!("transaction hash '{}': {}", tx_hash, e))
        })?;
        Ok(PendingTx { tx_hash })
    }
}

impl ChainBackend for HttpChain {
    async fn submit_deployment(&self, init_code: Bytes) -> Result<PendingTx, DeployError> {
        self.send_transaction(serde_json::json!({
            "from": self.from,
            "data": init_code,
            "gas": DEPLOY_GAS,
        }))
        .await
    }

    async fn submit_call(&self, to: Address, calldata: Bytes) -> Result<PendingTx, DeployError> {
        self.send_transaction(serde_json::json!({
            "from": self.from,
            "to": to,
            "data": calldata,
            "gas": CALL_GAS,
        }))
        .await
    }

    async fn inclusion(&self, tx_hash: B256) -> Result<Option<TxInclusion>, DeployError> {
        let receipt: Option<Value> = rpc::json_rpc_call(
            &self.client,
            self.url.as_str(),
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };

        let block_number = receipt
            .get("blockNumber")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                DeployError::NetworkUnavailable("receipt without blockNumber".to_string())
            })
            .and_then(|raw| rpc::parse_hex_u64(raw, "receipt blockNumber"))?;

        let succeeded = receipt
            .get("status")
            .and_then(|v| v.as_str())
            .map(|s| s == "0x1")
            .unwrap_or(false);

        let contract_address = receipt
            .get("contractAddress")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Address>().ok());

        Ok(Some(TxInclusion {
            tx_hash,
            block_number,
            succeeded,
            contract_address,
        }))
    }

    async fn block_number(&self) -> Result<u64, DeployError> {
        let raw: String =
            rpc::json_rpc_call(&self.client, self.url.as_str(), "eth_blockNumber", vec![]).await?;
        rpc::parse_hex_u64(&raw, "eth_blockNumber")
    }
}
