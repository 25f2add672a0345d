//! Shared error taxonomy for chain-facing ports.

use thiserror::Error;

/// Failure of a balance query, price query, or trade submission.
///
/// Every variant resolves to "defer, try next cycle" at the orchestration
/// layer; an RPC failure is never interpreted as a business-level result
/// such as an insufficient balance.
#[derive(Debug, Error, Clone)]
pub enum RpcError {
    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The node accepted the request but returned an error response.
    #[error("node error: {0}")]
    Node(String),
}
