//! Core domain types for the gofer trade execution bot.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `TokenAmount`, `Address`: precision-safe value types
//! - `Alert`, `AlertId`, `Direction`: durable trade signals
//! - `PendingOrder`, `OrderStatus`: ledger records
//! - `Clock`: injectable time source for deterministic tests
//! - `RpcError`: shared failure taxonomy for the chain-facing ports

pub mod alert;
pub mod amount;
pub mod clock;
pub mod error;
pub mod order;

pub use alert::{Alert, AlertId, AlertRecord, Direction};
pub use amount::{Address, TokenAmount};
pub use clock::{Clock, SystemClock};
pub use error::RpcError;
pub use order::{OrderStatus, Outcome, PendingOrder, TradeReceipt};
