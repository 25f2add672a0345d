//! Minimal JSON-RPC client over HTTP.

use gofer_core::{Address, RpcError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client with a per-request timeout.
///
/// Exceeded timeouts surface as `RpcError::Timeout`, which every caller
/// translates into "defer to next cycle" — a slow node must never block
/// the scan indefinitely.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    timeout_ms: u64,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout_ms: timeout.as_millis() as u64,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC call.
    pub async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        trace!(method, url = %self.url, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let body: RpcResponse<T> = response.json().await.map_err(|e| self.classify(e))?;

        if let Some(err) = body.error {
            return Err(RpcError::Node(format!("{} (code {})", err.message, err.code)));
        }
        body.result
            .ok_or_else(|| RpcError::Node(format!("{method}: response carried no result")))
    }

    fn classify(&self, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout(self.timeout_ms)
        } else {
            RpcError::Transport(e.to_string())
        }
    }

    /// `eth_call` against `to` with pre-encoded calldata; returns the raw
    /// hex result.
    pub async fn eth_call(&self, to: &Address, data: &[u8]) -> Result<String, RpcError> {
        let params = json!([
            { "to": to.as_str(), "data": format!("0x{}", hex::encode(data)) },
            "latest",
        ]);
        self.call("eth_call", params).await
    }

    /// `eth_sendTransaction` from a node-managed account; returns the
    /// transaction hash.
    pub async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: &[u8],
        gas_limit: u64,
    ) -> Result<String, RpcError> {
        let params = json!([{
            "from": from.as_str(),
            "to": to.as_str(),
            "data": format!("0x{}", hex::encode(data)),
            "gas": format!("0x{gas_limit:x}"),
        }]);
        let tx_hash: String = self.call("eth_sendTransaction", params).await?;
        debug!(%from, %to, tx_hash = %tx_hash, "transaction submitted");
        Ok(tx_hash)
    }
}

/// Decode a `0x`-prefixed hex payload from an `eth_call` result.
pub fn decode_hex_payload(raw: &str) -> Result<Vec<u8>, RpcError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(stripped).map_err(|e| RpcError::Node(format!("undecodable call result: {e}")))
}
