//! Execution engine: live trade submission or a logging simulation path.

use crate::error::ExecError;
use gofer_core::{Address, Alert, RpcError, TokenAmount, TradeReceipt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Port to the live trade submission.
///
/// `alert` carries the order data (direction, quantity, addresses),
/// `signer` is the held slot's identity, and `amount` is the computed
/// trade amount (buy cost, or the sell quantity).
pub trait TradePrimitive: Send + Sync {
    fn execute<'a>(
        &'a self,
        alert: &'a Alert,
        signer: &'a Address,
        amount: TokenAmount,
    ) -> BoxFuture<'a, Result<TradeReceipt, RpcError>>;
}

/// Routes execution to the live primitive or to the simulation path.
///
/// In simulation mode no network interaction happens: the intended action
/// is logged and a synthetic success receipt is returned, so the rest of
/// the pipeline runs identically with or without live funds.
#[derive(Clone)]
pub enum ExecutionEngine {
    Live(Arc<dyn TradePrimitive>),
    Simulation,
}

impl ExecutionEngine {
    pub fn is_simulation(&self) -> bool {
        matches!(self, Self::Simulation)
    }

    pub async fn execute(
        &self,
        alert: &Alert,
        slot: usize,
        signer: &Address,
        amount: TokenAmount,
    ) -> Result<TradeReceipt, ExecError> {
        match self {
            Self::Live(primitive) => primitive
                .execute(alert, signer, amount)
                .await
                .map_err(ExecError::Submission),
            Self::Simulation => {
                info!(
                    alert_id = %alert.id,
                    direction = %alert.direction,
                    slot,
                    signer = %signer,
                    quantity = %alert.quantity,
                    amount = %amount,
                    holder = %alert.holder_address,
                    counterparty = %alert.counterparty_address,
                    "simulation: logging trade instead of submitting"
                );
                Ok(TradeReceipt {
                    id: format!("sim-{}", Uuid::new_v4()),
                    simulated: true,
                })
            }
        }
    }
}
