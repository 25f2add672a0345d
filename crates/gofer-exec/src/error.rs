//! Error types for execution and orchestration.

use gofer_alerts::AlertError;
use gofer_core::RpcError;
use gofer_ledger::LedgerError;
use thiserror::Error;

/// Execution engine error types.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The trade primitive rejected or failed the submission. The caller
    /// finalizes the order as failed and releases the slot.
    #[error("trade submission failed: {0}")]
    Submission(#[source] RpcError),
}

/// Cycle-level orchestration failures.
///
/// Per-alert failures never surface here; they resolve inside the cycle
/// to skip, defer, or finalize-failed. Only the queue scan itself can
/// fail a cycle.
#[derive(Debug, Error)]
pub enum GoferError {
    #[error(transparent)]
    Alerts(#[from] AlertError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result type alias for orchestration operations.
pub type GoferResult<T> = std::result::Result<T, GoferError>;
