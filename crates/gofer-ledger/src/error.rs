//! Error types for the order ledger.

use gofer_core::AlertId;
use thiserror::Error;

/// Order ledger error types.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An order for this alert id already exists. Not an error to the
    /// orchestrator: the alert is already in flight (or already settled)
    /// and the redelivery is skipped.
    #[error("order for alert {0} already recorded")]
    DuplicateOrder(AlertId),

    /// No order exists for this alert id.
    #[error("no order recorded for alert {0}")]
    UnknownOrder(AlertId),

    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
