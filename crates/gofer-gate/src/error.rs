//! Error types for the balance gate.

use gofer_core::{Address, RpcError, TokenAmount};
use thiserror::Error;

/// Balance gate error types.
#[derive(Debug, Error)]
pub enum GateError {
    /// The account cannot cover the required amount. `available` is None
    /// when a cached negative result short-circuited the query.
    #[error("insufficient balance for {address}: required {required}")]
    Insufficient {
        address: Address,
        required: TokenAmount,
        available: Option<TokenAmount>,
    },

    /// The balance oracle failed. The caller must treat this as "defer,
    /// try next cycle" — never as "insufficient".
    #[error("balance check failed: {0}")]
    Oracle(#[from] RpcError),
}

/// Result type alias for gate operations.
pub type GateResult<T> = std::result::Result<T, GateError>;
