//! Price oracle port (buy direction only).

use crate::engine::BoxFuture;
use gofer_core::{RpcError, TokenAmount};

/// Port to the buy-price computation.
///
/// Quotes the payment amount required to buy `quantity` tokens. The sell
/// direction never consults a price oracle; its trade amount is the
/// quantity itself.
pub trait PriceOracle: Send + Sync {
    fn get_buy_price<'a>(
        &'a self,
        quantity: TokenAmount,
    ) -> BoxFuture<'a, Result<TokenAmount, RpcError>>;
}
