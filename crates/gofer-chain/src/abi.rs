//! ABI definitions for the token contract surface this bot touches.

use gofer_core::{Address, RpcError};
use alloy::primitives::Address as EthAddress;
use alloy::sol;

// Token contract surface used by the bot.
sol! {
    function balanceOf(address owner) external view returns (uint256);
    function getBuyPrice(uint256 quantity) external view returns (uint256);
    function buy(uint256 quantity, address recipient, uint256 maxCost) external;
    function sell(uint256 quantity, address holder) external;
}

/// Parse a configured/alert address into the ABI address type.
pub fn parse_address(address: &Address) -> Result<EthAddress, RpcError> {
    address
        .as_str()
        .parse::<EthAddress>()
        .map_err(|e| RpcError::Node(format!("invalid address {address}: {e}")))
}
