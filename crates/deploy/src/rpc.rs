//! Shared JSON-RPC plumbing for the chain backend.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DeployError;

/// Timeout for a single RPC request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between polls while waiting on inclusion or confirmations.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Create an HTTP client configured for JSON-RPC requests.
pub(crate) fn create_client() -> Result<reqwest::Client, DeployError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| DeployError::NetworkUnavailable(format!("http client: {}", e)))
}

/// Make a JSON-RPC call and deserialize the result.
///
/// Transport failures map to `NetworkUnavailable`; error responses from the
/// node are classified by message (funds, revert) so callers see the error
/// taxonomy rather than raw strings.
pub(crate) async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, DeployError> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .map_err(|e| DeployError::NetworkUnavailable(format!("{}: {}", method, e)))?;

    let result: Value = response
        .json()
        .await
        .map_err(|e| DeployError::NetworkUnavailable(format!("{}: {}", method, e)))?;

    if let Some(error) = result.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown");
        return Err(classify_rpc_error(method, message));
    }

    let result_value = result
        .get("result")
        .ok_or_else(|| {
            DeployError::NetworkUnavailable(format!("{}: no result in response", method))
        })?
        .clone();

    serde_json::from_value(result_value)
        .map_err(|e| DeployError::NetworkUnavailable(format!("{}: {}", method, e)))
}

/// Map a node error message onto the error taxonomy.
fn classify_rpc_error(method: &str, message: &str) -> DeployError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") {
        DeployError::InsufficientFunds(message.to_string())
    } else if lower.contains("revert") {
        DeployError::DeploymentReverted {
            what: method.to_string(),
            tx_hash: None,
        }
    } else {
        DeployError::NetworkUnavailable(format!("{}: {}", method, message))
    }
}

/// Parse a `0x`-prefixed hex quantity from an RPC response.
pub(crate) fn parse_hex_u64(raw: &str, what: &str) -> Result<u64, DeployError> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| DeployError::NetworkUnavailable(format!("{}: '{}': {}", what, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_insufficient_funds() {
        assert!(matches!(
            classify_rpc_error(
                "eth_sendTransaction",
                "Insufficient funds for gas * price + value"
            ),
            DeployError::InsufficientFunds(_)
        ));
    }

    #[test]
    fn test_classify_submission_revert() {
        assert!(matches!(
            classify_rpc_error("eth_sendTransaction", "execution reverted: not owner"),
            DeployError::DeploymentReverted { tx_hash: None, .. }
        ));
    }

    #[test]
    fn test_classify_other_errors_as_unavailable() {
        assert!(matches!(
            classify_rpc_error("eth_blockNumber", "connection reset"),
            DeployError::NetworkUnavailable(_)
        ));
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x10", "block number").unwrap(), 16);
        assert_eq!(parse_hex_u64("0x0", "block number").unwrap(), 0);
        assert!(parse_hex_u64("sixteen", "block number").is_err());
    }
}
