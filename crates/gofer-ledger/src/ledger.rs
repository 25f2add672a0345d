//! Order ledger implementation.

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gofer_core::{AlertId, Direction, OrderStatus, Outcome, PendingOrder};
use gofer_fleet::KeyFleet;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const RECORD_EXTENSION: &str = "json";

/// Disposition of an order once the sweep has marked it stale.
///
/// The source behavior here is an explicit configuration point rather
/// than an inferred default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Keep the stale record on disk for manual review. Its alert id
    /// stays occupied, so a redelivered alert will not re-execute.
    #[default]
    Abandon,
    /// Delete the stale record so a redelivered alert can record a
    /// fresh order.
    Requeue,
}

/// Durable registry of in-flight orders, shared by both direction workers.
///
/// One JSON record per order under the ledger directory, mirrored by a
/// concurrent in-memory index. `open` replays the directory, restoring
/// slot holds for orders that were submitted before a crash; the sweep
/// reclaims those slots once the orders exceed the stale threshold.
pub struct OrderLedger {
    dir: PathBuf,
    index: DashMap<AlertId, PendingOrder>,
    fleet: Arc<KeyFleet>,
    warning_interval: ChronoDuration,
    policy: StalePolicy,
}

impl OrderLedger {
    /// Open the ledger, replaying any durable records.
    pub fn open(
        dir: impl Into<PathBuf>,
        fleet: Arc<KeyFleet>,
        warning_interval: Duration,
        policy: StalePolicy,
    ) -> LedgerResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let index = DashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let order: PendingOrder = match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(order) => order,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping malformed ledger record");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable ledger record");
                    continue;
                }
            };
            if order.status == OrderStatus::Submitted
                && !fleet.restore(order.slot_index, &order.alert_id)
            {
                warn!(
                    alert_id = %order.alert_id,
                    slot = order.slot_index,
                    "could not restore slot hold for replayed order"
                );
            }
            index.insert(order.alert_id.clone(), order);
        }

        if !index.is_empty() {
            info!(replayed = index.len(), dir = %dir.display(), "order ledger replayed durable records");
        }

        Ok(Self {
            dir,
            index,
            fleet,
            warning_interval: ChronoDuration::from_std(warning_interval)
                .unwrap_or(ChronoDuration::MAX),
            policy,
        })
    }

    fn record_path(&self, id: &AlertId) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", id.as_str()))
    }

    fn write_record(&self, path: &Path, order: &PendingOrder) -> LedgerResult<()> {
        fs::write(path, serde_json::to_string_pretty(order)?)?;
        Ok(())
    }

    /// Insert a new pending order.
    ///
    /// Fails with `DuplicateOrder` if any order for the alert id already
    /// exists — in flight, stale, or settled. This is what turns the
    /// queue's at-least-once delivery into an exactly-once end effect.
    pub fn record(&self, order: PendingOrder) -> LedgerResult<()> {
        let path = self.record_path(&order.alert_id);
        match self.index.entry(order.alert_id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateOrder(order.alert_id)),
            Entry::Vacant(vacant) => {
                // create_new: a durable record this process does not know
                // about must not be silently overwritten.
                let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(file) => file,
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        return Err(LedgerError::DuplicateOrder(order.alert_id));
                    }
                    Err(e) => return Err(e.into()),
                };
                serde_json::to_writer_pretty(&file, &order)?;
                debug!(
                    alert_id = %order.alert_id,
                    slot = order.slot_index,
                    direction = %order.direction,
                    "pending order recorded"
                );
                vacant.insert(order);
                Ok(())
            }
        }
    }

    /// Bump `last_refreshed_at`, resetting the staleness clock so a
    /// concurrent sweep does not reclaim the slot of an order that is
    /// legitimately still being retried. No-op on terminal orders.
    pub fn refresh(&self, id: &AlertId, now: DateTime<Utc>) -> LedgerResult<()> {
        let order = {
            let mut entry = self
                .index
                .get_mut(id)
                .ok_or_else(|| LedgerError::UnknownOrder(id.clone()))?;
            if entry.status.is_terminal() {
                return Ok(());
            }
            entry.last_refreshed_at = now;
            entry.clone()
        };
        self.write_record(&self.record_path(id), &order)?;
        debug!(alert_id = %id, "pending order refreshed");
        Ok(())
    }

    /// Sweep one direction's non-terminal orders.
    ///
    /// Every order whose staleness clock exceeds `stale_threshold` gets a
    /// warning (at most one per `warning_interval` per order, to avoid
    /// log storms on persistent staleness). An order still in `Submitted`
    /// has its slot released back to the pool and is marked `Stale`; the
    /// configured policy then decides whether the stale record is kept
    /// for review or deleted for requeue.
    ///
    /// Returns the ids of orders newly marked stale.
    pub fn sweep_stale(
        &self,
        now: DateTime<Utc>,
        stale_threshold: Duration,
        direction: Direction,
    ) -> Vec<AlertId> {
        let threshold = ChronoDuration::from_std(stale_threshold)
            .unwrap_or(ChronoDuration::MAX);

        let candidates: Vec<AlertId> = self
            .index
            .iter()
            .filter(|entry| {
                entry.direction == direction
                    && !entry.status.is_terminal()
                    && now - entry.staleness_reference() > threshold
            })
            .map(|entry| entry.alert_id.clone())
            .collect();

        let mut swept = Vec::new();
        for id in candidates {
            let order = {
                let Some(mut entry) = self.index.get_mut(&id) else {
                    continue;
                };
                // Re-check under the write guard: a refresh or finalize may
                // have won the race since the scan.
                if entry.status.is_terminal() || now - entry.staleness_reference() <= threshold {
                    continue;
                }
                let should_warn = entry
                    .last_warned_at
                    .map_or(true, |warned| now - warned >= self.warning_interval);
                if should_warn {
                    warn!(
                        alert_id = %id,
                        slot = entry.slot_index,
                        direction = %entry.direction,
                        submitted_at = %entry.submitted_at,
                        "pending order exceeded stale threshold"
                    );
                    entry.last_warned_at = Some(now);
                }
                if entry.status == OrderStatus::Submitted {
                    self.fleet.release(entry.slot_index);
                    entry.status = OrderStatus::Stale;
                    swept.push(id.clone());
                }
                entry.clone()
            };

            match self.policy {
                StalePolicy::Requeue => {
                    self.index.remove(&id);
                    if let Err(e) = fs::remove_file(self.record_path(&id)) {
                        if e.kind() != ErrorKind::NotFound {
                            warn!(alert_id = %id, error = %e, "failed to remove stale order record");
                        }
                    }
                }
                StalePolicy::Abandon => {
                    if let Err(e) = self.write_record(&self.record_path(&id), &order) {
                        warn!(alert_id = %id, error = %e, "failed to persist stale order record");
                    }
                }
            }
        }
        swept
    }

    /// Set a terminal status and release the associated slot.
    pub fn finalize(&self, id: &AlertId, outcome: Outcome) -> LedgerResult<()> {
        let (order, held_slot) = {
            let mut entry = self
                .index
                .get_mut(id)
                .ok_or_else(|| LedgerError::UnknownOrder(id.clone()))?;
            // Only a Submitted order still holds its slot; a Stale order's
            // slot was already reclaimed and may belong to someone else.
            let held_slot = (entry.status == OrderStatus::Submitted).then_some(entry.slot_index);
            entry.status = outcome.status();
            (entry.clone(), held_slot)
        };
        if let Some(slot) = held_slot {
            self.fleet.release(slot);
        }
        self.write_record(&self.record_path(id), &order)?;
        info!(
            alert_id = %id,
            direction = %order.direction,
            status = %order.status,
            "order finalized"
        );
        Ok(())
    }

    /// Current record for an alert id, if any.
    pub fn get(&self, id: &AlertId) -> Option<PendingOrder> {
        self.index.get(id).map(|entry| entry.clone())
    }

    /// Current non-terminal record for an alert id, if any.
    pub fn active_order(&self, id: &AlertId) -> Option<PendingOrder> {
        self.index
            .get(id)
            .filter(|entry| !entry.status.is_terminal())
            .map(|entry| entry.clone())
    }

    /// Number of tracked orders (terminal included, until requeued).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
