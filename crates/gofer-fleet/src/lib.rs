//! Signer key fleet: a fixed pool of mutually-exclusive slots.
//!
//! Every in-flight order holds exactly one slot for the duration of its
//! execution, which is what prevents two orders from signing with the same
//! key concurrently (nonce collisions, double-submission). Both direction
//! workers share one fleet.

pub mod error;
pub mod slots;

pub use error::{FleetError, FleetResult};
pub use slots::KeyFleet;
