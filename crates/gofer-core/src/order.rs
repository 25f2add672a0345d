//! Pending-order records and execution outcomes.

use crate::alert::{AlertId, Direction};
use crate::amount::TokenAmount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Handed to execution, awaiting finalization.
    Submitted,
    /// Reclaimed by the staleness sweep; slot released.
    Stale,
    /// Execution confirmed.
    Completed,
    /// Execution failed.
    Failed,
}

impl OrderStatus {
    /// Terminal statuses no longer hold a slot and are never swept.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Stale => write!(f, "stale"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome applied by `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

impl Outcome {
    pub fn status(&self) -> OrderStatus {
        match self {
            Self::Completed => OrderStatus::Completed,
            Self::Failed => OrderStatus::Failed,
        }
    }
}

/// Ledger record of an alert that has been handed to execution.
///
/// Created exactly once per alert id; the duplicate-insert check on
/// creation is the system's defense against at-least-once alert delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub alert_id: AlertId,
    pub slot_index: usize,
    pub direction: Direction,
    pub quantity: TokenAmount,
    pub computed_amount: TokenAmount,
    pub status: OrderStatus,
    pub submitted_at: DateTime<Utc>,
    pub last_refreshed_at: DateTime<Utc>,
    /// Last time the staleness sweep warned about this order, for
    /// rate-limiting the warning log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_warned_at: Option<DateTime<Utc>>,
}

impl PendingOrder {
    pub fn new(
        alert_id: AlertId,
        slot_index: usize,
        direction: Direction,
        quantity: TokenAmount,
        computed_amount: TokenAmount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id,
            slot_index,
            direction,
            quantity,
            computed_amount,
            status: OrderStatus::Submitted,
            submitted_at: now,
            last_refreshed_at: now,
            last_warned_at: None,
        }
    }

    /// Reference point for the staleness clock: submission time, or the
    /// most recent refresh if one has occurred since.
    pub fn staleness_reference(&self) -> DateTime<Utc> {
        self.last_refreshed_at.max(self.submitted_at)
    }
}

/// Receipt returned by the trade primitive.
///
/// The simulation path synthesizes one so the ledger lifecycle is
/// identical with or without live funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// Transaction hash in live mode, a synthetic id in simulation.
    pub id: String,
    pub simulated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_order(now: DateTime<Utc>) -> PendingOrder {
        PendingOrder::new(
            AlertId::new("alert-1"),
            0,
            Direction::Buy,
            TokenAmount::new(dec!(10)),
            TokenAmount::new(dec!(25)),
            now,
        )
    }

    #[test]
    fn test_new_order_is_submitted() {
        let now = Utc::now();
        let order = sample_order(now);
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(!order.status.is_terminal());
        assert_eq!(order.staleness_reference(), now);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Stale.is_terminal());
        assert!(!OrderStatus::Submitted.is_terminal());
    }

    #[test]
    fn test_refresh_moves_staleness_reference() {
        let now = Utc::now();
        let mut order = sample_order(now);
        let later = now + chrono::Duration::minutes(3);
        order.last_refreshed_at = later;
        assert_eq!(order.staleness_reference(), later);
    }

    #[test]
    fn test_order_roundtrip() {
        let order = sample_order(Utc::now());
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("alertId"));
        assert!(json.contains("\"submitted\""));
        let back: PendingOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.alert_id, order.alert_id);
        assert_eq!(back.status, order.status);
    }
}
