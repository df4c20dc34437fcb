//! Minimal JSON-RPC client for the three node calls the agent needs:
//! `eth_getTransactionCount`, `eth_sendRawTransaction`, and
//! `eth_getTransactionReceipt`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ChainError, ChainResult};

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Transaction receipt fields the agent interprets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Execution status: "0x1" success, "0x0" reverted.
    pub status: Option<String>,
    /// Block the transaction was included in (hex quantity).
    pub block_number: Option<String>,
}

impl Receipt {
    /// Whether execution succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }

    /// Parsed inclusion block number.
    pub fn block(&self) -> ChainResult<u64> {
        let raw = self
            .block_number
            .as_deref()
            .ok_or_else(|| ChainError::InvalidResponse("receipt without blockNumber".to_string()))?;
        parse_quantity(raw)
    }
}

/// HTTP JSON-RPC client.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for the given endpoint.
    ///
    /// Every request is bounded by `request_timeout`; a node that accepts
    /// the connection and then never answers surfaces as a transport error
    /// instead of hanging the caller.
    pub fn new(url: String, request_timeout: Duration) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// Perform one JSON-RPC call; a missing `result` is an error.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<T> {
        self.call_opt(method, params).await?.ok_or_else(|| {
            ChainError::InvalidResponse(format!("null result for {method}"))
        })
    }

    /// Perform one JSON-RPC call where a null `result` is meaningful
    /// (e.g. no receipt yet).
    async fn call_opt<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(response.result)
    }

    /// Next usable nonce for the account, per the node's latest state.
    pub async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        let raw: String = self
            .call("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    /// Broadcast a signed raw transaction; returns its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<B256> {
        let payload = format!("0x{}", hex::encode(raw));
        let hash: String = self.call("eth_sendRawTransaction", json!([payload])).await?;
        hash.parse()
            .map_err(|_| ChainError::InvalidResponse(format!("malformed tx hash: {hash}")))
    }

    /// Receipt for the given hash, or `None` while the transaction is not
    /// yet included (or unknown to the node).
    pub async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<Receipt>> {
        self.call_opt("eth_getTransactionReceipt", json!([hash])).await
    }
}

/// Parse a 0x-prefixed hex quantity into a u64.
pub(crate) fn parse_quantity(raw: &str) -> ChainResult<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity without 0x prefix: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|_| ChainError::InvalidResponse(format!("malformed quantity: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1a").unwrap(), 26);
        assert_eq!(parse_quantity("0xDE0B6B3").unwrap(), 0xde0b6b3);
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        assert!(parse_quantity("26").is_err());
        assert!(parse_quantity("0xzz").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_receipt_status_interpretation() {
        let ok = Receipt {
            status: Some("0x1".to_string()),
            block_number: Some("0x10".to_string()),
        };
        assert!(ok.succeeded());
        assert_eq!(ok.block().unwrap(), 16);

        let reverted = Receipt {
            status: Some("0x0".to_string()),
            block_number: Some("0x10".to_string()),
        };
        assert!(!reverted.succeeded());
    }

    #[test]
    fn test_receipt_without_block_is_invalid() {
        let receipt = Receipt {
            status: Some("0x1".to_string()),
            block_number: None,
        };
        assert!(matches!(
            receipt.block(),
            Err(ChainError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_rpc_error_deserializes() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#;
        let parsed: RpcResponse<String> = serde_json::from_str(body).unwrap();
        assert!(parsed.result.is_none());
        let err = parsed.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "nonce too low");
    }

    #[test]
    fn test_null_result_deserializes_as_none() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let parsed: RpcResponse<Receipt> = serde_json::from_str(body).unwrap();
        assert!(parsed.result.is_none());
        assert!(parsed.error.is_none());
    }
}
