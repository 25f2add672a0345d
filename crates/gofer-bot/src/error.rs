//! Error types for the application layer.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] gofer_ledger::LedgerError),

    #[error(transparent)]
    Rpc(#[from] gofer_core::RpcError),
}

/// Result type alias for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
