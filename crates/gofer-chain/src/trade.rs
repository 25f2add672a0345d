//! Live trade primitive: submits the buy/sell contract call.

use crate::abi::{self, buyCall, sellCall};
use crate::client::RpcClient;
use crate::units;
use alloy::sol_types::SolCall;
use gofer_core::{Address, Alert, Direction, RpcError, TokenAmount, TradeReceipt};
use gofer_exec::{BoxFuture, TradePrimitive};
use std::sync::Arc;
use tracing::info;

/// Submits trades from the held slot's signer address.
///
/// Signing is the node's concern: the transaction is sent with
/// `eth_sendTransaction` from a node-managed account, so no key material
/// passes through this process. Gas limits and the contract address are
/// opaque configuration passed through from the outside.
pub struct ChainTradePrimitive {
    client: Arc<RpcClient>,
    contract: Address,
    buy_gas_limit: u64,
    sell_gas_limit: u64,
    decimals: u32,
}

impl ChainTradePrimitive {
    pub fn new(
        client: Arc<RpcClient>,
        contract: Address,
        buy_gas_limit: u64,
        sell_gas_limit: u64,
        decimals: u32,
    ) -> Self {
        Self {
            client,
            contract,
            buy_gas_limit,
            sell_gas_limit,
            decimals,
        }
    }

    fn calldata(&self, alert: &Alert, amount: TokenAmount) -> Result<Vec<u8>, RpcError> {
        let quantity = units::to_base_units(alert.quantity, self.decimals)?;
        match alert.direction {
            Direction::Buy => Ok(buyCall {
                quantity,
                recipient: abi::parse_address(&alert.counterparty_address)?,
                maxCost: units::to_base_units(amount, self.decimals)?,
            }
            .abi_encode()),
            Direction::Sell => Ok(sellCall {
                quantity,
                holder: abi::parse_address(&alert.holder_address)?,
            }
            .abi_encode()),
        }
    }
}

impl TradePrimitive for ChainTradePrimitive {
    fn execute<'a>(
        &'a self,
        alert: &'a Alert,
        signer: &'a Address,
        amount: TokenAmount,
    ) -> BoxFuture<'a, Result<TradeReceipt, RpcError>> {
        Box::pin(async move {
            let data = self.calldata(alert, amount)?;
            let gas_limit = match alert.direction {
                Direction::Buy => self.buy_gas_limit,
                Direction::Sell => self.sell_gas_limit,
            };
            let tx_hash = self
                .client
                .send_transaction(signer, &self.contract, &data, gas_limit)
                .await?;
            info!(
                alert_id = %alert.id,
                direction = %alert.direction,
                %signer,
                %amount,
                tx_hash = %tx_hash,
                "trade transaction submitted"
            );
            Ok(TradeReceipt {
                id: tx_hash,
                simulated: false,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gofer_core::AlertId;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn primitive() -> ChainTradePrimitive {
        let client =
            Arc::new(RpcClient::new("http://localhost:8545", Duration::from_secs(10)).unwrap());
        ChainTradePrimitive::new(
            client,
            Address::new("0x000000000000000000000000000000000000dEaD"),
            200_000,
            200_000,
            18,
        )
    }

    fn alert(direction: Direction) -> Alert {
        Alert {
            id: AlertId::new("a"),
            direction,
            quantity: TokenAmount::new(dec!(10)),
            holder_address: Address::new("0x1111111111111111111111111111111111111111"),
            counterparty_address: Address::new("0x2222222222222222222222222222222222222222"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_buy_calldata_uses_buy_selector() {
        let primitive = primitive();
        let data = primitive
            .calldata(&alert(Direction::Buy), TokenAmount::new(dec!(25)))
            .unwrap();
        assert_eq!(&data[..4], buyCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_sell_calldata_uses_sell_selector() {
        let primitive = primitive();
        let data = primitive
            .calldata(&alert(Direction::Sell), TokenAmount::new(dec!(10)))
            .unwrap();
        assert_eq!(&data[..4], sellCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_invalid_alert_address_rejected() {
        let primitive = primitive();
        let mut alert = alert(Direction::Sell);
        alert.holder_address = Address::new("not-an-address");
        assert!(primitive
            .calldata(&alert, TokenAmount::new(dec!(10)))
            .is_err());
    }
}
