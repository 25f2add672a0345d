//! Error types for the key fleet.

use thiserror::Error;

/// Key fleet error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// No slot freed within the caller's timeout budget. The caller
    /// defers the alert to the next scan cycle.
    #[error("no free key slot within {budget_ms}ms budget")]
    NoSlotAvailable { budget_ms: u64 },
}

/// Result type alias for fleet operations.
pub type FleetResult<T> = std::result::Result<T, FleetError>;
