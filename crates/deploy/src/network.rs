//! Network profile registry.
//!
//! Maps a network identifier to the chain parameters a deployment run needs:
//! chain id, RPC endpoint, confirmation depth, and the block-explorer
//! verification endpoint. Profiles come from a built-in table layered with an
//! optional `Networks.toml` file and `TRAILHEAD_NET_`-prefixed environment
//! variables, so RPC URLs and API keys never live in the repository.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Chain id reserved for the local deterministic test chain.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Confirmation depth applied to every public network.
pub const PUBLIC_CONFIRMATION_DEPTH: u64 = 6;

/// Extra blocks of slack in the confirmation wait window, covering the time
/// between submission and inclusion.
const WAIT_SLACK_BLOCKS: u64 = 4;

/// Floor for the wait window, so instant local chains still get a real bound.
const MIN_WAIT_SECS: u64 = 30;

/// Block-explorer verification endpoint for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Verification API endpoint, e.g. `https://api.etherscan.io/api`.
    pub api_url: String,
    /// API key, usually injected via `TRAILHEAD_NET_<NAME>__EXPLORER__API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Chain parameters for one deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Network identifier, equal to its registry key.
    #[serde(default)]
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Expected block time, used to bound confirmation waits.
    pub block_time_secs: u64,
    /// Blocks that must land on top of a transaction's inclusion block before
    /// it is treated as final. Always 0 on the local chain.
    pub confirmation_depth: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerConfig>,
}

impl NetworkProfile {
    /// Whether this profile targets the local deterministic test chain.
    pub fn is_local(&self) -> bool {
        self.chain_id == LOCAL_CHAIN_ID
    }

    /// Bounded wait window for one transaction needing `required`
    /// confirmations: expected block time times the depth, plus slack for
    /// inclusion itself.
    pub fn confirmation_timeout(&self, required: u64) -> Duration {
        let secs = self.block_time_secs * (required + WAIT_SLACK_BLOCKS);
        Duration::from_secs(secs.max(MIN_WAIT_SECS))
    }
}

/// Lookup table from network identifier to [`NetworkProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkRegistry {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl NetworkRegistry {
    /// The built-in profile table: the local hardhat chain plus the public
    /// networks the contract suite ships to. RPC URLs default to public
    /// endpoints and are expected to be overridden per deployment.
    pub fn builtin() -> Self {
        let mut registry = NetworkRegistry {
            profiles: BTreeMap::new(),
        };

        registry.insert(profile(
            "hardhat",
            LOCAL_CHAIN_ID,
            "http://127.0.0.1:8545",
            1,
            None,
        ));
        registry.insert(profile(
            "localhost",
            LOCAL_CHAIN_ID,
            "http://127.0.0.1:8545",
            1,
            None,
        ));
        registry.insert(profile(
            "sepolia",
            11155111,
            "https://ethereum-sepolia-rpc.publicnode.com",
            12,
            Some("https://api-sepolia.etherscan.io/api"),
        ));
        registry.insert(profile(
            "mumbai",
            80001,
            "https://rpc-mumbai.maticvigil.com",
            2,
            Some("https://api-testnet.polygonscan.com/api"),
        ));
        registry.insert(profile(
            "fuji",
            43113,
            "https://api.avax-test.network/ext/bc/C/rpc",
            2,
            Some("https://api-testnet.snowtrace.io/api"),
        ));
        registry.insert(profile(
            "op-sepolia",
            11155420,
            "https://sepolia.optimism.io",
            2,
            Some("https://api-sepolia-optimistic.etherscan.io/api"),
        ));
        registry.insert(profile(
            "ethereum",
            1,
            "https://ethereum-rpc.publicnode.com",
            12,
            Some("https://api.etherscan.io/api"),
        ));
        registry.insert(profile(
            "polygon",
            137,
            "https://polygon-rpc.com",
            2,
            Some("https://api.polygonscan.com/api"),
        ));
        registry.insert(profile(
            "avalanche",
            43114,
            "https://api.avax.network/ext/bc/C/rpc",
            2,
            Some("https://api.snowtrace.io/api"),
        ));

        registry
    }

    /// Build the registry: built-in defaults, merged with an optional TOML
    /// overrides file, merged with `TRAILHEAD_NET_` environment variables
    /// (e.g. `TRAILHEAD_NET_SEPOLIA__RPC_URL`).
    pub fn load(overrides: Option<&Path>) -> Result<Self, DeployError> {
        let mut figment = Figment::from(Serialized::defaults(Self::builtin()));
        if let Some(path) = overrides {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("TRAILHEAD_NET_").split("__"));

        let mut registry: Self = figment
            .extract()
            .map_err(|e| DeployError::ConfigMalformed(format!("network profile table: {}", e)))?;
        registry.normalize();
        Ok(registry)
    }

    /// Look up the profile for `name`.
    pub fn resolve(&self, name: &str) -> Result<&NetworkProfile, DeployError> {
        self.profiles
            .get(name)
            .ok_or_else(|| DeployError::UnknownNetwork(name.to_string()))
    }

    /// Register a profile under its own name, normalizing it first.
    pub fn insert(&mut self, mut profile: NetworkProfile) {
        normalize_profile(&mut profile);
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Profiles in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }

    /// Re-establish per-profile invariants after deserialization: names match
    /// keys, the local chain has depth 0 and no explorer, and public chains
    /// have a non-zero depth.
    fn normalize(&mut self) {
        for (name, profile) in self.profiles.iter_mut() {
            profile.name = name.clone();
            normalize_profile(profile);
        }
    }
}

/// Depth is 0 iff the chain id is the reserved local id; a public profile
/// configured with depth 0 is bumped to the standard public depth.
fn normalize_profile(profile: &mut NetworkProfile) {
    if profile.is_local() {
        profile.confirmation_depth = 0;
        profile.explorer = None;
    } else if profile.confirmation_depth == 0 {
        profile.confirmation_depth = PUBLIC_CONFIRMATION_DEPTH;
    }
}

fn profile(
    name: &str,
    chain_id: u64,
    rpc_url: &str,
    block_time_secs: u64,
    explorer_api: Option<&str>,
) -> NetworkProfile {
    NetworkProfile {
        name: name.to_string(),
        chain_id,
        rpc_url: rpc_url.to_string(),
        block_time_secs,
        confirmation_depth: if chain_id == LOCAL_CHAIN_ID {
            0
        } else {
            PUBLIC_CONFIRMATION_DEPTH
        },
        explorer: explorer_api.map(|api_url| ExplorerConfig {
            api_url: api_url.to_string(),
            api_key: None,
        }),
    }
}
