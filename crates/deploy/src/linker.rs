//! Cross-contract constructor argument resolution.
//!
//! Contracts whose constructors need another contract's address get it from
//! the prior deployment records, never from an ambient variable. Resolution
//! is pure: no transactions, no fabricated placeholder addresses.

use alloy_core::dyn_abi::DynSolValue;
use alloy_core::primitives::U256;

use crate::ContractRole;
use crate::config::{CollectionParams, DeploymentConfig, GameParams, TokenParams};
use crate::deployer::DeploymentRecord;
use crate::error::DeployError;

/// Find the record for `role`, if it has been deployed in this run.
pub fn find_record(records: &[DeploymentRecord], role: ContractRole) -> Option<&DeploymentRecord> {
    records.iter().find(|r| r.role == role)
}

/// Resolve the ordered constructor arguments for `role`, looking up dependent
/// addresses in `prior_records`.
///
/// A missing dependency record is a pipeline-ordering bug and fails with
/// `DependencyNotDeployed`; it is never papered over.
pub fn resolve_constructor_args(
    role: ContractRole,
    config: &DeploymentConfig,
    prior_records: &[DeploymentRecord],
) -> Result<Vec<DynSolValue>, DeployError> {
    let missing_params = || {
        DeployError::ConfigMalformed(format!(
            "network '{}': missing role block '{}'",
            config.network, role
        ))
    };

    match role {
        ContractRole::Token => {
            let params = config.token.as_ref().ok_or_else(missing_params)?;
            Ok(token_args(params))
        }
        ContractRole::Game => {
            let params = config.game.as_ref().ok_or_else(missing_params)?;
            game_args(params, prior_records)
        }
        ContractRole::Collection => {
            let params = config.collection.as_ref().ok_or_else(missing_params)?;
            Ok(collection_args(params))
        }
    }
}

/// `FeeToken(string name, string symbol, uint256 initialSupply, address owner)`
fn token_args(params: &TokenParams) -> Vec<DynSolValue> {
    vec![
        DynSolValue::String(params.name.clone()),
        DynSolValue::String(params.symbol.clone()),
        DynSolValue::Uint(U256::from(params.initial_supply), 256),
        DynSolValue::Address(params.owner),
    ]
}

/// `Bandit(uint256 blocksToAct, address feeToken, uint256 rollFee, uint256 rerollFee)`
fn game_args(
    params: &GameParams,
    prior_records: &[DeploymentRecord],
) -> Result<Vec<DynSolValue>, DeployError> {
    let token = find_record(prior_records, ContractRole::Token).ok_or(
        DeployError::DependencyNotDeployed {
            missing: ContractRole::Token,
            needed_by: "game constructor".to_string(),
        },
    )?;

    Ok(vec![
        DynSolValue::Uint(U256::from(params.blocks_to_act), 256),
        DynSolValue::Address(token.address),
        DynSolValue::Uint(U256::from(params.roll_fee), 256),
        DynSolValue::Uint(U256::from(params.reroll_fee), 256),
    ])
}

/// `NFT(string name, string symbol, address owner)`
fn collection_args(params: &CollectionParams) -> Vec<DynSolValue> {
    vec![
        DynSolValue::String(params.name.clone()),
        DynSolValue::String(params.symbol.clone()),
        DynSolValue::Address(params.owner),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{Address, B256};
    use chrono::Utc;
    use serde_json::json;

    const OWNER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const TOKEN_ADDR: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn config() -> DeploymentConfig {
        DeploymentConfig::from_value(
            "hardhat",
            &json!({
                "token": {
                    "name": "Fee",
                    "symbol": "FEE",
                    "initial_supply": 1000,
                    "owner": OWNER,
                },
                "game": {
                    "blocks_to_act": 10,
                    "roll_fee": 5,
                    "reroll_fee": 2,
                },
            }),
        )
        .unwrap()
    }

    fn token_record() -> DeploymentRecord {
        DeploymentRecord {
            role: ContractRole::Token,
            network: "hardhat".to_string(),
            address: TOKEN_ADDR.parse().unwrap(),
            tx_hash: B256::ZERO,
            block_confirmations: 0,
            deployed_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_args_need_no_records() {
        let args = resolve_constructor_args(ContractRole::Token, &config(), &[]).unwrap();
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], DynSolValue::String("Fee".to_string()));
        assert_eq!(
            args[3],
            DynSolValue::Address(OWNER.parse::<Address>().unwrap())
        );
    }

    #[test]
    fn test_game_args_inject_token_address() {
        let records = vec![token_record()];
        let args = resolve_constructor_args(ContractRole::Game, &config(), &records).unwrap();

        assert_eq!(args.len(), 4);
        assert_eq!(
            args[1],
            DynSolValue::Address(TOKEN_ADDR.parse::<Address>().unwrap())
        );
        assert_eq!(args[2], DynSolValue::Uint(U256::from(5u64), 256));
    }

    #[test]
    fn test_game_without_token_record_is_dependency_error() {
        match resolve_constructor_args(ContractRole::Game, &config(), &[]) {
            Err(DeployError::DependencyNotDeployed { missing, .. }) => {
                assert_eq!(missing, ContractRole::Token);
            }
            other => panic!("expected DependencyNotDeployed, got {:?}", other),
        }
    }

    #[test]
    fn test_no_placeholder_address_is_ever_fabricated() {
        // Even with unrelated records present, a missing token dependency
        // must fail rather than resolve to anything.
        let mut record = token_record();
        record.role = ContractRole::Collection;

        assert!(matches!(
            resolve_constructor_args(ContractRole::Game, &config(), &[record]),
            Err(DeployError::DependencyNotDeployed { .. })
        ));
    }

    #[test]
    fn test_missing_params_are_malformed_config() {
        assert!(matches!(
            resolve_constructor_args(ContractRole::Collection, &config(), &[]),
            Err(DeployError::ConfigMalformed(_))
        ));
    }
}
