//! In-process chain backend double used by the pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_core::primitives::{Address, B256, Bytes, keccak256};
use trailhead_deploy::chain::{ChainBackend, PendingTx, TxInclusion};
use trailhead_deploy::error::DeployError;

/// A transaction submission observed by the mock chain, in order.
#[derive(Debug, Clone)]
pub enum Submission {
    Create { data: Bytes },
    Call { to: Address, data: Bytes },
}

struct MockTx {
    block: u64,
    succeeded: bool,
    contract_address: Option<Address>,
}

#[derive(Default)]
struct State {
    head: u64,
    nonce: u64,
    calls_seen: u64,
    txs: HashMap<B256, MockTx>,
    submissions: Vec<Submission>,
}

/// Deterministic in-memory chain.
///
/// Submissions are mined immediately; the head advances by one block per
/// `block_number` poll, so confirmation waits progress without wall-clock
/// time. Addresses and hashes derive from a submission counter.
pub struct MockChain {
    state: Mutex<State>,
    /// Accept submissions but never produce receipts.
    stalled: bool,
    /// 1-based index of the call submission whose receipt reverts.
    fail_call_at: Option<u64>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            stalled: false,
            fail_call_at: None,
        }
    }

    /// A chain where transactions are accepted but never included.
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::new()
        }
    }

    /// A chain where the `n`-th call transaction (1-based) reverts.
    pub fn failing_call(n: u64) -> Self {
        Self {
            fail_call_at: Some(n),
            ..Self::new()
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn call_count(&self) -> u64 {
        self.state.lock().unwrap().calls_seen
    }
}

impl ChainBackend for MockChain {
    async fn submit_deployment(&self, init_code: Bytes) -> Result<PendingTx, DeployError> {
        let mut state = self.state.lock().unwrap();
        state.nonce += 1;
        let tx_hash = keccak256(state.nonce.to_be_bytes());
        let address = Address::from_slice(&keccak256(tx_hash)[12..]);

        state.head += 1;
        let block = state.head;
        state.submissions.push(Submission::Create { data: init_code });
        if !self.stalled {
            state.txs.insert(
                tx_hash,
                MockTx {
                    block,
                    succeeded: true,
                    contract_address: Some(address),
                },
            );
        }
        Ok(PendingTx { tx_hash })
    }

    async fn submit_call(&self, to: Address, calldata: Bytes) -> Result<PendingTx, DeployError> {
        let mut state = self.state.lock().unwrap();
        state.nonce += 1;
        state.calls_seen += 1;
        let tx_hash = keccak256(state.nonce.to_be_bytes());
        let succeeded = Some(state.calls_seen) != self.fail_call_at;

        state.head += 1;
        let block = state.head;
        state.submissions.push(Submission::Call { to, data: calldata });
        if !self.stalled {
            state.txs.insert(
                tx_hash,
                MockTx {
                    block,
                    succeeded,
                    contract_address: None,
                },
            );
        }
        Ok(PendingTx { tx_hash })
    }

    async fn inclusion(&self, tx_hash: B256) -> Result<Option<TxInclusion>, DeployError> {
        let state = self.state.lock().unwrap();
        Ok(state.txs.get(&tx_hash).map(|tx| TxInclusion {
            tx_hash,
            block_number: tx.block,
            succeeded: tx.succeeded,
            contract_address: tx.contract_address,
        }))
    }

    async fn block_number(&self) -> Result<u64, DeployError> {
        let mut state = self.state.lock().unwrap();
        state.head += 1;
        Ok(state.head)
    }
}
