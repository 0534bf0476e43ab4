//! Deployment configuration store.
//!
//! Reads `deployment-config.json`, a mapping from network identifier to a
//! per-role parameter block, and validates the whole per-network block up
//! front. Nothing touches the chain until this validation has passed, so a
//! bad fee or a missing owner fails the run before any transaction exists.

use std::path::Path;

use alloy_core::primitives::Address;
use serde_json::Value;

use crate::ContractRole;
use crate::error::DeployError;

/// Units the collection pre-mints to its owner when the config omits
/// `premint`.
pub const DEFAULT_PREMINT: u64 = 3;

/// Constructor parameters for the `FeeToken` ERC20.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub initial_supply: u128,
    pub owner: Address,
}

/// Constructor parameters for the `Bandit` game contract. The fee token
/// address is deliberately absent: it is injected by the linker from the
/// token's deployment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameParams {
    pub blocks_to_act: u64,
    pub roll_fee: u128,
    pub reroll_fee: u128,
}

/// Constructor and setup parameters for the `NFT` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionParams {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub base_uri: String,
    pub premint: u64,
}

/// Validated per-network deployment parameters, keyed by contract role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub network: String,
    pub token: Option<TokenParams>,
    pub game: Option<GameParams>,
    pub collection: Option<CollectionParams>,
}

impl DeploymentConfig {
    /// Load and validate the configuration block for `network` from the JSON
    /// file at `path`.
    pub fn load(path: &Path, network: &str) -> Result<Self, DeployError> {
        let not_found = || DeployError::ConfigNotFound {
            path: path.to_path_buf(),
            network: network.to_string(),
        };

        if !path.exists() {
            return Err(not_found());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::ConfigMalformed(format!("{}: {}", path.display(), e)))?;
        let root: Value = serde_json::from_str(&content)
            .map_err(|e| DeployError::ConfigMalformed(format!("{}: {}", path.display(), e)))?;

        let block = root.get(network).ok_or_else(not_found)?;
        Self::from_value(network, block)
    }

    /// Validate one network's configuration block.
    pub fn from_value(network: &str, block: &Value) -> Result<Self, DeployError> {
        let block = block.as_object().ok_or_else(|| {
            DeployError::ConfigMalformed(format!(
                "network '{}': expected an object of role blocks",
                network
            ))
        })?;

        for key in block.keys() {
            if !matches!(key.as_str(), "token" | "game" | "collection") {
                return Err(DeployError::ConfigMalformed(format!(
                    "network '{}': unknown role '{}'",
                    network, key
                )));
            }
        }

        let token = block
            .get("token")
            .map(|v| parse_token(network, v))
            .transpose()?;
        let game = block
            .get("game")
            .map(|v| parse_game(network, v))
            .transpose()?;
        let collection = block
            .get("collection")
            .map(|v| parse_collection(network, v))
            .transpose()?;

        Ok(DeploymentConfig {
            network: network.to_string(),
            token,
            game,
            collection,
        })
    }

    /// Check that every role a run covers has a parameter block.
    pub fn require_roles(&self, roles: &[ContractRole]) -> Result<(), DeployError> {
        for role in roles {
            let present = match role {
                ContractRole::Token => self.token.is_some(),
                ContractRole::Game => self.game.is_some(),
                ContractRole::Collection => self.collection.is_some(),
            };
            if !present {
                return Err(DeployError::ConfigMalformed(format!(
                    "network '{}': missing role block '{}'",
                    self.network, role
                )));
            }
        }
        Ok(())
    }
}

fn parse_token(network: &str, value: &Value) -> Result<TokenParams, DeployError> {
    let fields = role_object(network, "token", value)?;
    reject_unknown(
        network,
        "token",
        fields,
        &["name", "symbol", "initial_supply", "owner"],
    )?;
    Ok(TokenParams {
        name: require_string(network, "token", fields, "name")?,
        symbol: require_string(network, "token", fields, "symbol")?,
        initial_supply: require_uint(network, "token", fields, "initial_supply")?,
        owner: require_address(network, "token", fields, "owner")?,
    })
}

fn parse_game(network: &str, value: &Value) -> Result<GameParams, DeployError> {
    let fields = role_object(network, "game", value)?;
    reject_unknown(
        network,
        "game",
        fields,
        &["blocks_to_act", "roll_fee", "reroll_fee"],
    )?;
    Ok(GameParams {
        blocks_to_act: require_u64(network, "game", fields, "blocks_to_act")?,
        roll_fee: require_uint(network, "game", fields, "roll_fee")?,
        reroll_fee: require_uint(network, "game", fields, "reroll_fee")?,
    })
}

fn parse_collection(network: &str, value: &Value) -> Result<CollectionParams, DeployError> {
    let fields = role_object(network, "collection", value)?;
    reject_unknown(
        network,
        "collection",
        fields,
        &["name", "symbol", "owner", "base_uri", "premint"],
    )?;
    let premint = match fields.get("premint") {
        Some(_) => require_u64(network, "collection", fields, "premint")?,
        None => DEFAULT_PREMINT,
    };
    Ok(CollectionParams {
        name: require_string(network, "collection", fields, "name")?,
        symbol: require_string(network, "collection", fields, "symbol")?,
        owner: require_address(network, "collection", fields, "owner")?,
        base_uri: require_string(network, "collection", fields, "base_uri")?,
        premint,
    })
}

type Fields = serde_json::Map<String, Value>;

fn role_object<'a>(network: &str, role: &str, value: &'a Value) -> Result<&'a Fields, DeployError> {
    value.as_object().ok_or_else(|| {
        DeployError::ConfigMalformed(format!(
            "{}.{}: expected an object of named parameters",
            network, role
        ))
    })
}

fn reject_unknown(
    network: &str,
    role: &str,
    fields: &Fields,
    allowed: &[&str],
) -> Result<(), DeployError> {
    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(DeployError::ConfigMalformed(format!(
                "{}.{}: unknown field '{}'",
                network, role, key
            )));
        }
    }
    Ok(())
}

fn require<'a>(
    network: &str,
    role: &str,
    fields: &'a Fields,
    field: &str,
) -> Result<&'a Value, DeployError> {
    fields.get(field).ok_or_else(|| {
        DeployError::ConfigMalformed(format!("{}.{}: missing field '{}'", network, role, field))
    })
}

fn require_string(
    network: &str,
    role: &str,
    fields: &Fields,
    field: &str,
) -> Result<String, DeployError> {
    let value = require(network, role, fields, field)?;
    value.as_str().map(String::from).ok_or_else(|| {
        DeployError::ConfigMalformed(format!(
            "{}.{}.{}: expected a string, got {}",
            network, role, field, value
        ))
    })
}

/// A fee or supply: a non-negative integer. Negative and non-numeric values
/// are malformed, reported by field rather than as a stray decode error.
fn require_uint(
    network: &str,
    role: &str,
    fields: &Fields,
    field: &str,
) -> Result<u128, DeployError> {
    let value = require(network, role, fields, field)?;
    value
        .as_u64()
        .map(u128::from)
        .or_else(|| value.as_number().and_then(|n| n.as_u128()))
        .ok_or_else(|| {
            DeployError::ConfigMalformed(format!(
                "{}.{}.{}: expected a non-negative integer, got {}",
                network, role, field, value
            ))
        })
}

fn require_u64(
    network: &str,
    role: &str,
    fields: &Fields,
    field: &str,
) -> Result<u64, DeployError> {
    let value = require(network, role, fields, field)?;
    value.as_u64().ok_or_else(|| {
        DeployError::ConfigMalformed(format!(
            "{}.{}.{}: expected a non-negative integer, got {}",
            network, role, field, value
        ))
    })
}

fn require_address(
    network: &str,
    role: &str,
    fields: &Fields,
    field: &str,
) -> Result<Address, DeployError> {
    let raw = require_string(network, role, fields, field)?;
    raw.parse::<Address>().map_err(|e| {
        DeployError::ConfigMalformed(format!(
            "{}.{}.{}: invalid address '{}': {}",
            network, role, field, raw, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn sample_block() -> Value {
        json!({
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
            "collection": {
                "name": "Trail",
                "symbol": "TRL",
                "owner": OWNER,
                "base_uri": "ipfs://QmTrail/",
            },
        })
    }

    #[test]
    fn test_parses_all_roles() {
        let config = DeploymentConfig::from_value("hardhat", &sample_block()).unwrap();

        let token = config.token.unwrap();
        assert_eq!(token.name, "Fee");
        assert_eq!(token.initial_supply, 1000);
        assert_eq!(token.owner, OWNER.parse::<Address>().unwrap());

        let game = config.game.unwrap();
        assert_eq!(game.blocks_to_act, 10);
        assert_eq!(game.roll_fee, 5);

        // premint falls back to the default when omitted.
        assert_eq!(config.collection.unwrap().premint, DEFAULT_PREMINT);
    }

    #[test]
    fn test_negative_fee_is_malformed() {
        let mut block = sample_block();
        block["game"]["roll_fee"] = json!(-5);

        match DeploymentConfig::from_value("hardhat", &block) {
            Err(DeployError::ConfigMalformed(msg)) => {
                assert!(msg.contains("game.roll_fee"), "unexpected message: {msg}");
                assert!(msg.contains("non-negative"), "unexpected message: {msg}");
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_supply_is_malformed() {
        let mut block = sample_block();
        block["token"]["initial_supply"] = json!("plenty");

        assert!(matches!(
            DeploymentConfig::from_value("hardhat", &block),
            Err(DeployError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let mut block = sample_block();
        block["token"].as_object_mut().unwrap().remove("symbol");

        match DeploymentConfig::from_value("hardhat", &block) {
            Err(DeployError::ConfigMalformed(msg)) => {
                assert!(msg.contains("missing field 'symbol'"), "{msg}");
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        let mut block = sample_block();
        block["game"]["luck"] = json!(7);

        match DeploymentConfig::from_value("hardhat", &block) {
            Err(DeployError::ConfigMalformed(msg)) => {
                assert!(msg.contains("unknown field 'luck'"), "{msg}");
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_owner_address_is_malformed() {
        let mut block = sample_block();
        block["token"]["owner"] = json!("0x1234");

        assert!(matches!(
            DeploymentConfig::from_value("hardhat", &block),
            Err(DeployError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn test_require_roles_reports_missing_block() {
        let mut block = sample_block();
        block.as_object_mut().unwrap().remove("game");
        let config = DeploymentConfig::from_value("hardhat", &block).unwrap();

        assert!(config.require_roles(&[ContractRole::Token]).is_ok());
        match config.require_roles(&[ContractRole::Token, ContractRole::Game]) {
            Err(DeployError::ConfigMalformed(msg)) => {
                assert!(msg.contains("missing role block 'game'"), "{msg}");
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempdir::TempDir::new("trailhead-config").unwrap();
        let path = dir.path().join("deployment-config.json");

        assert!(matches!(
            DeploymentConfig::load(&path, "sepolia"),
            Err(DeployError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_load_missing_network_is_not_found() {
        let dir = tempdir::TempDir::new("trailhead-config").unwrap();
        let path = dir.path().join("deployment-config.json");
        std::fs::write(&path, json!({ "hardhat": sample_block() }).to_string()).unwrap();

        match DeploymentConfig::load(&path, "sepolia") {
            Err(DeployError::ConfigNotFound { network, .. }) => assert_eq!(network, "sepolia"),
            other => panic!("expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempdir::TempDir::new("trailhead-config").unwrap();
        let path = dir.path().join("deployment-config.json");
        std::fs::write(&path, json!({ "fuji": sample_block() }).to_string()).unwrap();

        let config = DeploymentConfig::load(&path, "fuji").unwrap();
        assert_eq!(config.network, "fuji");
        assert!(config.token.is_some());
    }
}
