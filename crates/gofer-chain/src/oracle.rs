//! Live balance and price oracles.

use crate::abi::{self, balanceOfCall, getBuyPriceCall};
use crate::client::{decode_hex_payload, RpcClient};
use crate::units;
use alloy::sol_types::SolCall;
use gofer_core::{Address, RpcError, TokenAmount};
use gofer_exec::PriceOracle;
use gofer_gate::{BalanceOracle, BoxFuture};
use std::sync::Arc;
use tracing::trace;

/// ERC-20 `balanceOf` oracle against the token contract.
pub struct ChainBalanceOracle {
    client: Arc<RpcClient>,
    token: Address,
    decimals: u32,
}

impl ChainBalanceOracle {
    pub fn new(client: Arc<RpcClient>, token: Address, decimals: u32) -> Self {
        Self {
            client,
            token,
            decimals,
        }
    }
}

impl BalanceOracle for ChainBalanceOracle {
    fn get_balance<'a>(
        &'a self,
        address: &'a Address,
    ) -> BoxFuture<'a, Result<TokenAmount, RpcError>> {
        Box::pin(async move {
            let call = balanceOfCall {
                owner: abi::parse_address(address)?,
            };
            let raw = self.client.eth_call(&self.token, &call.abi_encode()).await?;
            let decoded = balanceOfCall::abi_decode_returns(&decode_hex_payload(&raw)?, true)
                .map_err(|e| RpcError::Node(format!("undecodable balanceOf result: {e}")))?;
            let balance = units::from_base_units(decoded._0, self.decimals)?;
            trace!(%address, %balance, "balance fetched");
            Ok(balance)
        })
    }
}

/// Contract view-call oracle quoting the payment amount for a buy.
pub struct ChainPriceOracle {
    client: Arc<RpcClient>,
    contract: Address,
    decimals: u32,
}

impl ChainPriceOracle {
    pub fn new(client: Arc<RpcClient>, contract: Address, decimals: u32) -> Self {
        Self {
            client,
            contract,
            decimals,
        }
    }
}

impl PriceOracle for ChainPriceOracle {
    fn get_buy_price<'a>(
        &'a self,
        quantity: TokenAmount,
    ) -> gofer_exec::BoxFuture<'a, Result<TokenAmount, RpcError>> {
        Box::pin(async move {
            let call = getBuyPriceCall {
                quantity: units::to_base_units(quantity, self.decimals)?,
            };
            let raw = self
                .client
                .eth_call(&self.contract, &call.abi_encode())
                .await?;
            let decoded = getBuyPriceCall::abi_decode_returns(&decode_hex_payload(&raw)?, true)
                .map_err(|e| RpcError::Node(format!("undecodable getBuyPrice result: {e}")))?;
            let price = units::from_base_units(decoded._0, self.decimals)?;
            trace!(%quantity, %price, "buy price fetched");
            Ok(price)
        })
    }
}
