//! Execution engine and per-direction orchestration.
//!
//! The `Gofer` drives one trade direction: it drains the durable alert
//! queue and, per alert, acquires a signer slot, gates on balance,
//! computes the buy price where needed, records the order, executes, and
//! finalizes. The `ExecutionEngine` routes execution to the live trade
//! primitive or to a logging simulation path that exercises the identical
//! ledger lifecycle.

pub mod engine;
pub mod error;
pub mod gofer;
pub mod price;

pub use engine::{BoxFuture, ExecutionEngine, TradePrimitive};
pub use error::{ExecError, GoferError, GoferResult};
pub use gofer::{CycleStats, Gofer};
pub use price::PriceOracle;
