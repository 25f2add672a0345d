//! Balance gate: admission check combining the oracle with the cache.

use crate::cache::LowBalanceCache;
use crate::error::{GateError, GateResult};
use gofer_core::{Address, Clock, Direction, RpcError, TokenAmount};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Port to the on-chain balance query.
///
/// Implemented by the RPC adapter in production and by scripted stand-ins
/// in tests; the gate never cares which.
pub trait BalanceOracle: Send + Sync {
    fn get_balance<'a>(&'a self, address: &'a Address)
        -> BoxFuture<'a, Result<TokenAmount, RpcError>>;
}

/// Admission check run before a trade may execute.
///
/// The cache is consulted for sells only: the sell side re-checks the same
/// holder addresses cycle after cycle, and a known-insufficient holder is
/// not worth a network query until the TTL lapses. The buy side checks the
/// treasury balance, which moves with every settled trade, so it always
/// queries fresh.
pub struct BalanceGate {
    oracle: Arc<dyn BalanceOracle>,
    cache: LowBalanceCache,
}

impl BalanceGate {
    pub fn new(oracle: Arc<dyn BalanceOracle>, cache_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            oracle,
            cache: LowBalanceCache::new(cache_ttl, clock),
        }
    }

    /// Check that `address` can cover `required`.
    ///
    /// A negative result for a sell is cached with a fresh TTL; a positive
    /// result is never cached. An oracle failure propagates as
    /// `GateError::Oracle` and must be treated as "defer", not as
    /// "insufficient".
    pub async fn check_sufficient(
        &self,
        address: &Address,
        required: TokenAmount,
        direction: Direction,
    ) -> GateResult<()> {
        if direction == Direction::Sell && self.cache.is_marked_low(address) {
            debug!(%address, %required, "cached low balance, skipping query");
            return Err(GateError::Insufficient {
                address: address.clone(),
                required,
                available: None,
            });
        }

        let available = self.oracle.get_balance(address).await?;

        if available >= required {
            return Ok(());
        }

        if direction == Direction::Sell {
            self.cache.note_insufficient(address);
        }
        Err(GateError::Insufficient {
            address: address.clone(),
            required,
            available: Some(available),
        })
    }
}
