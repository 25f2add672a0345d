//! Error types for the alert queue.

use gofer_core::AlertId;
use std::path::PathBuf;
use thiserror::Error;

/// Alert queue error types.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The record no longer exists. Benign: another worker or a previous
    /// cycle already consumed it.
    #[error("alert {0} not found")]
    NotFound(AlertId),

    /// The record exists but does not parse. The file is left in place
    /// for inspection; the caller logs and skips.
    #[error("malformed alert record at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("alert store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for alert queue operations.
pub type AlertResult<T> = std::result::Result<T, AlertError>;
