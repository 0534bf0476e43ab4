//! Error taxonomy for the deployment pipeline.
//!
//! Components never retry or swallow these internally; the pipeline driver
//! surfaces the first fatal error and halts the remaining steps.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use alloy_core::primitives::B256;

use crate::ContractRole;

/// Errors produced by the deployment pipeline and its collaborators.
#[derive(Debug, Clone)]
pub enum DeployError {
    /// The requested network identifier has no registered profile.
    UnknownNetwork(String),
    /// No deployment configuration exists for the requested network.
    ConfigNotFound { path: PathBuf, network: String },
    /// The configuration exists but fails schema validation.
    ConfigMalformed(String),
    /// A compiled contract artifact could not be read.
    ArtifactMissing { contract: String, reason: String },
    /// A constructor or setup argument references a role with no deployment
    /// record. Signals a pipeline-ordering defect, not a retryable condition.
    DependencyNotDeployed {
        missing: ContractRole,
        needed_by: String,
    },
    /// A submitted transaction reverted. `tx_hash` is absent when the node
    /// rejected the transaction before inclusion.
    DeploymentReverted {
        what: String,
        tx_hash: Option<B256>,
    },
    /// Confirmations did not accrue within the bounded wait window.
    ConfirmationTimeout {
        what: String,
        waited_secs: u64,
        confirmed: u64,
        required: u64,
    },
    /// The deployer account cannot cover the transaction.
    InsufficientFunds(String),
    /// The RPC endpoint is unreachable or misbehaving.
    NetworkUnavailable(String),
    /// The block-explorer verification service rejected the submission.
    /// Non-fatal: logged by the driver, never retried.
    VerificationFailed(String),
}

impl DeployError {
    /// Stable kind identifier, printed by the CLI on abort.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::UnknownNetwork(_) => "unknown-network",
            DeployError::ConfigNotFound { .. } => "config-not-found",
            DeployError::ConfigMalformed(_) => "config-malformed",
            DeployError::ArtifactMissing { .. } => "artifact-missing",
            DeployError::DependencyNotDeployed { .. } => "dependency-not-deployed",
            DeployError::DeploymentReverted { .. } => "deployment-reverted",
            DeployError::ConfirmationTimeout { .. } => "confirmation-timeout",
            DeployError::InsufficientFunds(_) => "insufficient-funds",
            DeployError::NetworkUnavailable(_) => "network-unavailable",
            DeployError::VerificationFailed(_) => "verification-failed",
        }
    }

    /// Whether this error aborts the pipeline. Verification failures do not
    /// affect on-chain correctness and are the only non-fatal kind.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeployError::VerificationFailed(_))
    }
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::UnknownNetwork(name) => {
                write!(f, "no network profile registered for '{}'", name)
            }
            DeployError::ConfigNotFound { path, network } => write!(
                f,
                "no deployment configuration for network '{}' in {}",
                network,
                path.display()
            ),
            DeployError::ConfigMalformed(msg) => {
                write!(f, "malformed deployment configuration: {}", msg)
            }
            DeployError::ArtifactMissing { contract, reason } => {
                write!(f, "cannot load artifact for {}: {}", contract, reason)
            }
            DeployError::DependencyNotDeployed { missing, needed_by } => write!(
                f,
                "{} requires the {} contract, which has no deployment record yet",
                needed_by, missing
            ),
            DeployError::DeploymentReverted { what, tx_hash } => match tx_hash {
                Some(hash) => write!(f, "{} reverted (tx {})", what, hash),
                None => write!(f, "{} rejected by the node", what),
            },
            DeployError::ConfirmationTimeout {
                what,
                waited_secs,
                confirmed,
                required,
            } => write!(
                f,
                "{}: {}/{} confirmations after {}s",
                what, confirmed, required, waited_secs
            ),
            DeployError::InsufficientFunds(msg) => {
                write!(f, "insufficient funds: {}", msg)
            }
            DeployError::NetworkUnavailable(msg) => {
                write!(f, "network unavailable: {}", msg)
            }
            DeployError::VerificationFailed(msg) => {
                write!(f, "source verification failed: {}", msg)
            }
        }
    }
}

impl Error for DeployError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_verification_errors_are_non_fatal() {
        assert!(!DeployError::VerificationFailed("rejected".into()).is_fatal());
        assert!(DeployError::UnknownNetwork("moonbase".into()).is_fatal());
        assert!(DeployError::ConfigMalformed("bad fee".into()).is_fatal());
        assert!(
            DeployError::ConfirmationTimeout {
                what: "token deployment".into(),
                waited_secs: 120,
                confirmed: 2,
                required: 6,
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(
            DeployError::UnknownNetwork("x".into()).kind(),
            "unknown-network"
        );
        assert_eq!(
            DeployError::DependencyNotDeployed {
                missing: ContractRole::Token,
                needed_by: "game constructor".into(),
            }
            .kind(),
            "dependency-not-deployed"
        );
        assert_eq!(
            DeployError::InsufficientFunds("balance 0".into()).kind(),
            "insufficient-funds"
        );
    }
}
