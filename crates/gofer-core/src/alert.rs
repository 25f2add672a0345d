//! Trade alert types.
//!
//! An alert is one durable trade signal produced by an external generator.
//! The identity of an alert is derived from its storage location (file
//! stem), not from the record body; the direction comes from which store
//! the record lives in.

use crate::amount::{Address, TokenAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Identifier of a durable alert record.
///
/// Derived from the record's file stem; also keys the pending-order
/// ledger, which is how duplicate deliveries of the same alert are
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(String);

impl AlertId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Wire schema of a durable alert record.
///
/// Field names match the external producer's JSON. `createdAt` is
/// optional on the wire; when the producer omits it, the time of first
/// parse is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub quantity: TokenAmount,
    pub holder_address: Address,
    pub counterparty_address: Address,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A fully resolved trade alert: record body plus storage-derived identity.
///
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct Alert {
    pub id: AlertId,
    pub direction: Direction,
    pub quantity: TokenAmount,
    pub holder_address: Address,
    pub counterparty_address: Address,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Combine a parsed record with its storage-derived identity.
    pub fn from_record(id: AlertId, direction: Direction, record: AlertRecord) -> Self {
        Self {
            id,
            direction,
            quantity: record.quantity,
            holder_address: record.holder_address,
            counterparty_address: record.counterparty_address,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_wire_format() {
        let json = r#"{
            "quantity": "10",
            "holderAddress": "0xHolder",
            "counterpartyAddress": "0xGamer"
        }"#;
        let record: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.quantity, TokenAmount::new(dec!(10)));
        assert_eq!(record.holder_address.as_str(), "0xholder");
    }

    #[test]
    fn test_created_at_defaults_when_missing() {
        let json = r#"{"quantity": "1", "holderAddress": "a", "counterpartyAddress": "b"}"#;
        let record: AlertRecord = serde_json::from_str(json).unwrap();
        assert!(record.created_at <= Utc::now());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Buy.to_string(), "buy");
        assert_eq!(Direction::Sell.to_string(), "sell");
        assert!(Direction::Buy.is_buy());
        assert!(!Direction::Sell.is_buy());
    }
}
