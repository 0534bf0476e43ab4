//! Compiled contract artifacts and ABI encoding.
//!
//! Artifacts are the JSON files the contract build writes (one per contract,
//! hardhat layout): creation bytecode plus optional source metadata for
//! block-explorer verification. Constructor arguments and call data are
//! ABI-encoded with `alloy`'s dynamic values, so the orchestrator never
//! hand-packs words.

use std::path::{Path, PathBuf};

use alloy_core::dyn_abi::DynSolValue;
use alloy_core::primitives::{Bytes, keccak256};
use serde::Deserialize;

use crate::ContractRole;
use crate::error::DeployError;

/// One compiled contract, as read from the artifacts directory.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    /// Creation bytecode, without constructor arguments.
    pub bytecode: Bytes,
    /// Flattened source, present when the build was run with verification
    /// metadata enabled.
    pub source: Option<String>,
    /// Compiler version string, e.g. `v0.8.20+commit.a1b79de6`.
    pub compiler_version: Option<String>,
}

/// Loads artifacts by contract role from a build output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    bytecode: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    compiler_version: Option<String>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the artifact backing `role` from `<dir>/<ContractName>.json`.
    pub fn load(&self, role: ContractRole) -> Result<ContractArtifact, DeployError> {
        let contract = role.contract_name();
        let path = self.dir.join(format!("{}.json", contract));
        let missing = |reason: String| DeployError::ArtifactMissing {
            contract: contract.to_string(),
            reason,
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| missing(format!("{}: {}", path.display(), e)))?;
        let raw: RawArtifact =
            serde_json::from_str(&content).map_err(|e| missing(format!("{}: {}", path.display(), e)))?;

        let bytecode = decode_hex(&raw.bytecode).map_err(|e| missing(format!("bytecode: {}", e)))?;
        if bytecode.is_empty() {
            return Err(missing("bytecode is empty".to_string()));
        }

        Ok(ContractArtifact {
            contract_name: raw.contract_name,
            bytecode: bytecode.into(),
            source: raw.source,
            compiler_version: raw.compiler_version,
        })
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(raw.trim_start_matches("0x"))
}

/// ABI-encode constructor arguments, for appending to creation bytecode or
/// submitting to a verification service. Empty for argument-less
/// constructors.
pub fn encode_constructor_args(args: &[DynSolValue]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }
    DynSolValue::Tuple(args.to_vec()).abi_encode_params()
}

/// Full init code for a creation transaction: bytecode followed by the
/// encoded constructor arguments.
pub fn init_code(artifact: &ContractArtifact, args: &[DynSolValue]) -> Bytes {
    let mut code = artifact.bytecode.to_vec();
    code.extend_from_slice(&encode_constructor_args(args));
    code.into()
}

/// First four bytes of the keccak hash of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI call data: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode_constructor_args(args));
    data.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{Address, U256};
    use serde_json::json;

    #[test]
    fn test_selector_matches_known_erc20_transfer() {
        assert_eq!(
            selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn test_encode_call_packs_static_args() {
        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            .parse()
            .unwrap();
        let data = encode_call("safeMint(address)", &[DynSolValue::Address(to)]);

        // selector + one 32-byte word.
        assert_eq!(data.len(), 4 + 32);
        // The address sits right-aligned in the word.
        assert_eq!(&data[16..36], to.as_slice());
    }

    #[test]
    fn test_encode_string_arg_uses_dynamic_layout() {
        let encoded = encode_constructor_args(&[DynSolValue::String("ab".to_string())]);

        // offset word, length word, one padded data word.
        assert_eq!(encoded.len(), 96);
        assert_eq!(U256::from_be_slice(&encoded[0..32]), U256::from(0x20));
        assert_eq!(U256::from_be_slice(&encoded[32..64]), U256::from(2));
        assert_eq!(&encoded[64..66], b"ab");
    }

    #[test]
    fn test_empty_constructor_args_encode_to_nothing() {
        assert!(encode_constructor_args(&[]).is_empty());
    }

    #[test]
    fn test_init_code_appends_encoded_args() {
        let artifact = ContractArtifact {
            contract_name: "FeeToken".to_string(),
            bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
            source: None,
            compiler_version: None,
        };
        let code = init_code(
            &artifact,
            &[DynSolValue::Uint(U256::from(1000u64), 256)],
        );

        assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
        assert_eq!(code.len(), 4 + 32);
        assert_eq!(U256::from_be_slice(&code[4..36]), U256::from(1000u64));
    }

    #[test]
    fn test_load_reads_hardhat_style_artifact() {
        let dir = tempdir::TempDir::new("trailhead-artifacts").unwrap();
        std::fs::write(
            dir.path().join("Bandit.json"),
            json!({
                "contractName": "Bandit",
                "bytecode": "0x6080604052",
                "compilerVersion": "v0.8.20+commit.a1b79de6",
            })
            .to_string(),
        )
        .unwrap();

        let store = ArtifactStore::new(dir.path());
        let artifact = store.load(ContractRole::Game).unwrap();
        assert_eq!(artifact.contract_name, "Bandit");
        assert_eq!(artifact.bytecode.len(), 5);
        assert!(artifact.source.is_none());
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempdir::TempDir::new("trailhead-artifacts").unwrap();
        let store = ArtifactStore::new(dir.path());

        match store.load(ContractRole::Token) {
            Err(DeployError::ArtifactMissing { contract, .. }) => {
                assert_eq!(contract, "FeeToken");
            }
            other => panic!("expected ArtifactMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_empty_bytecode() {
        let dir = tempdir::TempDir::new("trailhead-artifacts").unwrap();
        std::fs::write(
            dir.path().join("NFT.json"),
            json!({ "contractName": "NFT", "bytecode": "0x" }).to_string(),
        )
        .unwrap();

        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load(ContractRole::Collection),
            Err(DeployError::ArtifactMissing { .. })
        ));
    }
}
