//! Balance-gated execution admission.
//!
//! Combines a balance oracle with a short-lived negative-result cache.
//! Only negative results are memoized: a false negative is cheap to
//! re-verify on the next cycle, while a stale positive could promise value
//! against an actually-insufficient balance.

pub mod balance;
pub mod cache;
pub mod error;

pub use balance::{BalanceGate, BalanceOracle, BoxFuture};
pub use cache::LowBalanceCache;
pub use error::{GateError, GateResult};
