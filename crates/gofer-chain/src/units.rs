//! Conversions between decimal token amounts and base (integer) units.

use alloy::primitives::U256;
use gofer_core::{RpcError, TokenAmount};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// 10^decimals as a Decimal. Token decimals above 18 are not supported.
fn multiplier(decimals: u32) -> Result<Decimal, RpcError> {
    if decimals > 18 {
        return Err(RpcError::Node(format!(
            "unsupported token decimals: {decimals}"
        )));
    }
    Ok(Decimal::from(10u64.pow(decimals)))
}

/// Scale a decimal amount up to integer base units.
pub fn to_base_units(amount: TokenAmount, decimals: u32) -> Result<U256, RpcError> {
    let scaled = amount.inner() * multiplier(decimals)?;
    let raw = scaled
        .trunc()
        .to_u128()
        .ok_or_else(|| RpcError::Node(format!("amount {amount} out of range for base units")))?;
    Ok(U256::from(raw))
}

/// Scale integer base units down to a decimal amount.
pub fn from_base_units(raw: U256, decimals: u32) -> Result<TokenAmount, RpcError> {
    let raw: u128 = raw
        .try_into()
        .map_err(|_| RpcError::Node("balance exceeds supported range".to_string()))?;
    let value = Decimal::from_u128(raw)
        .ok_or_else(|| RpcError::Node("balance exceeds supported precision".to_string()))?;
    Ok(TokenAmount::new(value / multiplier(decimals)?))
}
