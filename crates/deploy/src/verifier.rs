//! Conditional source verification against block-explorer APIs.
//!
//! Local networks have no explorer, so verification is skipped wholesale
//! there. Everywhere else the deployed contract's source and constructor
//! arguments go to an Etherscan-compatible `verifysourcecode` endpoint.
//! Verification failures never abort a run: the contract on chain is correct
//! whether or not an explorer agrees to label it.

use alloy_core::dyn_abi::DynSolValue;
use serde::{Deserialize, Serialize};

use crate::artifacts::{ArtifactStore, encode_constructor_args};
use crate::deployer::DeploymentRecord;
use crate::error::DeployError;
use crate::network::NetworkProfile;
use crate::rpc;

/// Result of a verification attempt for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VerificationOutcome {
    /// Local network: nothing to verify against.
    Skipped,
    /// The explorer accepted the submission; `guid` tracks it.
    Submitted { guid: String },
    /// Recorded by the driver when a submission errored. `verify` itself
    /// reports errors as `VerificationFailed`, not through this variant.
    Failed { reason: String },
}

#[derive(Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: String,
}

/// Submits deployed contracts for block-explorer source verification.
pub struct VerificationTrigger<'a> {
    profile: &'a NetworkProfile,
    artifacts: &'a ArtifactStore,
}

impl<'a> VerificationTrigger<'a> {
    pub fn new(profile: &'a NetworkProfile, artifacts: &'a ArtifactStore) -> Self {
        Self { profile, artifacts }
    }

    /// Verify one deployed contract. Returns `Skipped` without any I/O on
    /// the local chain; otherwise submits and returns the tracking guid.
    pub async fn verify(
        &self,
        record: &DeploymentRecord,
        constructor_args: &[DynSolValue],
    ) -> Result<VerificationOutcome, DeployError> {
        if self.profile.confirmation_depth == 0 {
            tracing::debug!(
                role = %record.role,
                network = %self.profile.name,
                "Local network, skipping source verification"
            );
            return Ok(VerificationOutcome::Skipped);
        }

        let explorer = self.profile.explorer.as_ref().ok_or_else(|| {
            DeployError::VerificationFailed(format!(
                "network '{}' has no explorer configured",
                self.profile.name
            ))
        })?;
        let api_key = explorer.api_key.as_deref().ok_or_else(|| {
            DeployError::VerificationFailed(format!(
                "network '{}' has no explorer api key",
                self.profile.name
            ))
        })?;

        let artifact = self
            .artifacts
            .load(record.role)
            .map_err(|e| DeployError::VerificationFailed(e.to_string()))?;
        let source = artifact.source.ok_or_else(|| {
            DeployError::VerificationFailed(format!(
                "artifact for {} carries no source metadata",
                artifact.contract_name
            ))
        })?;
        let compiler_version = artifact.compiler_version.ok_or_else(|| {
            DeployError::VerificationFailed(format!(
                "artifact for {} carries no compiler version",
                artifact.contract_name
            ))
        })?;

        let encoded_args = hex::encode(encode_constructor_args(constructor_args));

        tracing::info!(
            role = %record.role,
            address = %record.address,
            network = %self.profile.name,
            "Submitting source verification"
        );

        let client =
            rpc::create_client().map_err(|e| DeployError::VerificationFailed(e.to_string()))?;
        let address = record.address.to_string();
        let form = [
            ("apikey", api_key),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", source.as_str()),
            ("contractname", artifact.contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
            // The Etherscan API spells the parameter this way.
            ("constructorArguements", encoded_args.as_str()),
        ];

        let response = client
            .post(&explorer.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeployError::VerificationFailed(format!("{}: {}", explorer.api_url, e)))?;
        let response: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| DeployError::VerificationFailed(format!("{}: {}", explorer.api_url, e)))?;

        if response.status != "1" {
            return Err(DeployError::VerificationFailed(format!(
                "{}: {}",
                response.message, response.result
            )));
        }

        tracing::info!(
            role = %record.role,
            guid = %response.result,
            "Verification submission accepted"
        );

        Ok(VerificationOutcome::Submitted {
            guid: response.result,
        })
    }
}
