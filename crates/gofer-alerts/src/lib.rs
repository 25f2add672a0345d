//! Durable file-backed alert queue.
//!
//! One JSON record per alert under a per-direction directory. Delivery is
//! at-least-once: a record stays on disk until `complete` removes it, so a
//! crash between processing and removal redelivers the alert on the next
//! scan. The exactly-once end effect is supplied downstream by the order
//! ledger's duplicate-insert check, not by this queue.

pub mod error;
pub mod store;

pub use error::{AlertError, AlertResult};
pub use store::AlertStore;
