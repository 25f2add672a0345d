//! Durable pending-order ledger.
//!
//! Registry of every alert that has been handed to execution. One JSON
//! record per order on disk plus an in-memory index; records are replayed
//! at open so the ledger is correct across crash/restart. The
//! duplicate-insert check on `record` is the system's de-duplication
//! mechanism against at-least-once alert delivery, and the staleness sweep
//! reclaims slots from orders that were abandoned mid-flight.

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{OrderLedger, StalePolicy};
