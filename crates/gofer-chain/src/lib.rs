//! JSON-RPC adapters behind the chain-facing ports.
//!
//! Live implementations of the balance oracle, the buy-price oracle, and
//! the trade primitive, all over one `RpcClient`. Contract semantics stay
//! on the other side of these narrow interfaces: calls are ABI-encoded
//! here, but signing and settlement are the node's concern.

pub mod abi;
pub mod client;
pub mod oracle;
pub mod trade;
pub mod units;

pub use client::RpcClient;
pub use oracle::{ChainBalanceOracle, ChainPriceOracle};
pub use trade::ChainTradePrimitive;
