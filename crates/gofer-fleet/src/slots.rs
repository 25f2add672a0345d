//! Slot pool implementation.

use crate::error::{FleetError, FleetResult};
use gofer_core::{Address, AlertId, Clock};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// State of one held slot.
#[derive(Debug, Clone)]
struct SlotHold {
    held_by: AlertId,
    assigned_at_ms: u64,
}

/// Fixed, ordered pool of signer slots.
///
/// # Guarantees
/// - At any instant, at most one order holds a given slot.
/// - Allocation is by lowest free index (deterministic tie-break).
/// - `acquire` and `release` are the only mutation paths for slot state;
///   one mutex guards all of it, so observe-and-claim is a single atomic
///   step for every concurrent caller.
pub struct KeyFleet {
    /// Signer identity per slot; the pool size is this vector's length.
    signers: Vec<Address>,
    slots: Mutex<Vec<Option<SlotHold>>>,
    /// Backoff between acquisition attempts while the pool is full.
    retry_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl KeyFleet {
    pub fn new(signers: Vec<Address>, retry_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let slots = Mutex::new(vec![None; signers.len()]);
        Self {
            signers,
            slots,
            retry_interval,
            clock,
        }
    }

    /// Number of slots in the pool (the fleet size).
    pub fn size(&self) -> usize {
        self.signers.len()
    }

    /// Signer identity for a slot index.
    pub fn signer_address(&self, slot: usize) -> Option<&Address> {
        self.signers.get(slot)
    }

    /// Number of currently held slots.
    pub fn held_count(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_some()).count()
    }

    /// Current holder of a slot, if any.
    pub fn holder(&self, slot: usize) -> Option<AlertId> {
        self.slots
            .lock()
            .get(slot)
            .and_then(|s| s.as_ref().map(|h| h.held_by.clone()))
    }

    /// Single atomic scan-and-claim of the lowest free slot.
    fn try_claim(&self, holder: &AlertId) -> Option<usize> {
        let mut slots = self.slots.lock();
        let index = slots.iter().position(|s| s.is_none())?;
        slots[index] = Some(SlotHold {
            held_by: holder.clone(),
            assigned_at_ms: self.clock.now_ms(),
        });
        Some(index)
    }

    /// Acquire the lowest-indexed free slot for `holder`.
    ///
    /// If the pool is full, waits the configured retry interval and scans
    /// again until a slot frees or `budget` is exhausted, at which point
    /// the call fails with `NoSlotAvailable`. This is the only
    /// intentionally blocking operation in the pipeline.
    pub async fn acquire(&self, holder: &AlertId, budget: Duration) -> FleetResult<usize> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            if let Some(index) = self.try_claim(holder) {
                debug!(slot = index, alert_id = %holder, "key slot acquired");
                return Ok(index);
            }
            if tokio::time::Instant::now() + self.retry_interval > deadline {
                return Err(FleetError::NoSlotAvailable {
                    budget_ms: budget.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.retry_interval).await;
        }
    }

    /// Mark a slot free. Idempotent: releasing an already-free slot is a
    /// no-op, so crash-recovery paths may release unconditionally.
    pub fn release(&self, slot: usize) {
        let mut slots = self.slots.lock();
        match slots.get_mut(slot) {
            Some(state) => {
                if let Some(hold) = state.take() {
                    debug!(
                        slot,
                        alert_id = %hold.held_by,
                        held_ms = self.clock.now_ms().saturating_sub(hold.assigned_at_ms),
                        "key slot released"
                    );
                }
            }
            None => warn!(slot, "release of out-of-range slot index ignored"),
        }
    }

    /// Re-mark a specific slot as held, used when the order ledger replays
    /// durable records after a restart. Returns false if the slot is out
    /// of range or already held.
    pub fn restore(&self, slot: usize, holder: &AlertId) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(slot) {
            Some(state) if state.is_none() => {
                *state = Some(SlotHold {
                    held_by: holder.clone(),
                    assigned_at_ms: self.clock.now_ms(),
                });
                true
            }
            _ => false,
        }
    }
}
