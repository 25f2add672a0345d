//! Per-direction orchestrator.

use crate::engine::ExecutionEngine;
use crate::error::GoferResult;
use crate::price::PriceOracle;
use chrono::Utc;
use gofer_alerts::{AlertError, AlertStore};
use gofer_core::{AlertId, Direction, OrderStatus, Outcome, PendingOrder};
use gofer_fleet::{FleetError, KeyFleet};
use gofer_gate::{BalanceGate, GateError};
use gofer_ledger::{LedgerError, OrderLedger};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Alerts seen this cycle.
    pub scanned: usize,
    /// Alerts executed and settled.
    pub executed: usize,
    /// Alerts left in the queue for the next cycle.
    pub deferred: usize,
    /// Alerts skipped (consumed elsewhere, malformed, or already known).
    pub skipped: usize,
    /// Alerts whose execution failed terminally.
    pub failed: usize,
}

/// How one alert's processing resolved. Every failure class lands in one
/// of these; nothing aborts the scan.
enum Disposition {
    Executed,
    Deferred,
    Skipped,
    Failed,
}

/// One trade direction's worker.
///
/// Constructed with interface-typed collaborators so every one of them is
/// independently substitutable in tests. Both direction instances share
/// the key fleet and the order ledger; the store, gate cache, and price
/// oracle are direction-local.
pub struct Gofer {
    store: AlertStore,
    fleet: Arc<KeyFleet>,
    ledger: Arc<OrderLedger>,
    gate: BalanceGate,
    price_oracle: Option<Arc<dyn PriceOracle>>,
    engine: ExecutionEngine,
    slot_acquire_budget: Duration,
    shutdown: CancellationToken,
}

impl Gofer {
    /// Buy-direction worker. The price oracle computes the payment amount
    /// for each alert's quantity.
    #[allow(clippy::too_many_arguments)]
    pub fn buy(
        store: AlertStore,
        fleet: Arc<KeyFleet>,
        ledger: Arc<OrderLedger>,
        gate: BalanceGate,
        price_oracle: Arc<dyn PriceOracle>,
        engine: ExecutionEngine,
        slot_acquire_budget: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        debug_assert_eq!(store.direction(), Direction::Buy);
        Self {
            store,
            fleet,
            ledger,
            gate,
            price_oracle: Some(price_oracle),
            engine,
            slot_acquire_budget,
            shutdown,
        }
    }

    /// Sell-direction worker.
    pub fn sell(
        store: AlertStore,
        fleet: Arc<KeyFleet>,
        ledger: Arc<OrderLedger>,
        gate: BalanceGate,
        engine: ExecutionEngine,
        slot_acquire_budget: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        debug_assert_eq!(store.direction(), Direction::Sell);
        Self {
            store,
            fleet,
            ledger,
            gate,
            price_oracle: None,
            engine,
            slot_acquire_budget,
            shutdown,
        }
    }

    pub fn direction(&self) -> Direction {
        self.store.direction()
    }

    /// Run one scan cycle. Idempotent and safe to invoke repeatedly on a
    /// timer; a shutdown signal stops the loop between alerts without
    /// discarding unprocessed records.
    pub async fn process_alerts(&self) -> GoferResult<CycleStats> {
        self.store.ensure_store()?;
        let ids: Vec<AlertId> = self.store.list_pending()?.collect();

        let mut stats = CycleStats::default();
        for id in ids {
            if self.shutdown.is_cancelled() {
                info!(
                    direction = %self.direction(),
                    processed = stats.scanned,
                    "shutdown requested, stopping scan between alerts"
                );
                break;
            }
            stats.scanned += 1;
            match self.process_one(&id).await {
                Disposition::Executed => stats.executed += 1,
                Disposition::Deferred => stats.deferred += 1,
                Disposition::Skipped => stats.skipped += 1,
                Disposition::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    async fn process_one(&self, id: &AlertId) -> Disposition {
        let direction = self.direction();

        // Loading
        let alert = match self.store.load(id) {
            Ok(alert) => alert,
            Err(AlertError::NotFound(_)) => {
                // Another worker or a previous cycle consumed it.
                return Disposition::Skipped;
            }
            Err(AlertError::Malformed { path, source }) => {
                warn!(
                    alert_id = %id,
                    %direction,
                    path = %path.display(),
                    error = %source,
                    "malformed alert record retained for inspection"
                );
                return Disposition::Skipped;
            }
            Err(AlertError::Io(e)) => {
                warn!(alert_id = %id, %direction, error = %e, "alert record unreadable, deferring");
                return Disposition::Deferred;
            }
        };

        // Redelivery: the ledger already knows this alert id.
        if let Some(existing) = self.ledger.get(id) {
            return self.handle_redelivery(id, existing.status);
        }

        // SlotAcquire
        let slot = match self.fleet.acquire(id, self.slot_acquire_budget).await {
            Ok(slot) => slot,
            Err(FleetError::NoSlotAvailable { budget_ms }) => {
                debug!(alert_id = %id, %direction, budget_ms, "no free key slot, deferring");
                return Disposition::Deferred;
            }
        };
        // A slot acquired for an alert whose processing is aborted must
        // not outlive the worker.
        if self.shutdown.is_cancelled() {
            self.fleet.release(slot);
            return Disposition::Deferred;
        }
        let Some(signer) = self.fleet.signer_address(slot).cloned() else {
            error!(alert_id = %id, slot, "no signer identity for slot");
            self.fleet.release(slot);
            return Disposition::Deferred;
        };

        // BalanceCheck: sell checks the holder's token balance, buy checks
        // the acquired slot's treasury balance.
        let subject = match direction {
            Direction::Sell => alert.holder_address.clone(),
            Direction::Buy => signer.clone(),
        };
        match self
            .gate
            .check_sufficient(&subject, alert.quantity, direction)
            .await
        {
            Ok(()) => {}
            Err(GateError::Insufficient { available, .. }) => {
                debug!(
                    alert_id = %id,
                    %direction,
                    address = %subject,
                    required = %alert.quantity,
                    available = ?available,
                    "insufficient balance, deferring"
                );
                self.fleet.release(slot);
                return Disposition::Deferred;
            }
            Err(GateError::Oracle(e)) => {
                warn!(alert_id = %id, %direction, address = %subject, error = %e, "balance check failed, deferring");
                self.fleet.release(slot);
                return Disposition::Deferred;
            }
        }

        // PriceCompute (buy only)
        let computed_amount = if direction.is_buy() {
            let Some(oracle) = self.price_oracle.as_ref() else {
                error!(alert_id = %id, "buy worker constructed without a price oracle");
                self.fleet.release(slot);
                return Disposition::Deferred;
            };
            match oracle.get_buy_price(alert.quantity).await {
                Ok(amount) => amount,
                Err(e) => {
                    warn!(alert_id = %id, error = %e, "price computation failed, deferring");
                    self.fleet.release(slot);
                    return Disposition::Deferred;
                }
            }
        } else {
            alert.quantity
        };

        // Record before executing: the duplicate-insert check must win
        // before any value moves, or a redelivered alert could trade twice.
        let now = Utc::now();
        let order = PendingOrder::new(
            id.clone(),
            slot,
            direction,
            alert.quantity,
            computed_amount,
            now,
        );
        match self.ledger.record(order) {
            Ok(()) => {}
            Err(LedgerError::DuplicateOrder(_)) => {
                // Raced a concurrent worker; their record stands.
                let _ = self.ledger.refresh(id, now);
                self.fleet.release(slot);
                debug!(alert_id = %id, %direction, "order already in flight, skipping");
                return Disposition::Skipped;
            }
            Err(e) => {
                warn!(alert_id = %id, error = %e, "failed to record pending order, deferring");
                self.fleet.release(slot);
                return Disposition::Deferred;
            }
        }

        // Execute, then finalize. The slot is owned by the recorded order
        // now; finalize releases it on both outcomes, and the staleness
        // sweep reclaims it if the process dies in between.
        match self
            .engine
            .execute(&alert, slot, &signer, computed_amount)
            .await
        {
            Ok(receipt) => {
                info!(
                    alert_id = %id,
                    %direction,
                    slot,
                    receipt = %receipt.id,
                    simulated = receipt.simulated,
                    amount = %computed_amount,
                    "trade executed"
                );
                if let Err(e) = self.ledger.finalize(id, Outcome::Completed) {
                    warn!(alert_id = %id, error = %e, "failed to finalize completed order");
                }
                // Cleanup: removal signals hand-off. If it fails the
                // redelivery is absorbed by the ledger's duplicate check.
                if let Err(e) = self.store.complete(id) {
                    warn!(alert_id = %id, error = %e, "failed to remove alert record");
                }
                Disposition::Executed
            }
            Err(e) => {
                error!(alert_id = %id, %direction, slot, error = %e, "trade execution failed");
                if let Err(e) = self.ledger.finalize(id, Outcome::Failed) {
                    warn!(alert_id = %id, error = %e, "failed to finalize failed order");
                }
                // Alert record retained for manual review.
                Disposition::Failed
            }
        }
    }

    /// An alert whose id the ledger already tracks was delivered again.
    fn handle_redelivery(&self, id: &AlertId, status: OrderStatus) -> Disposition {
        match status {
            OrderStatus::Completed => {
                // Settled, but a previous removal did not stick.
                debug!(alert_id = %id, "alert already settled, cleaning up record");
                if let Err(e) = self.store.complete(id) {
                    warn!(alert_id = %id, error = %e, "failed to remove settled alert record");
                }
                Disposition::Skipped
            }
            OrderStatus::Failed => {
                debug!(alert_id = %id, "alert previously failed, record retained for review");
                Disposition::Skipped
            }
            OrderStatus::Submitted | OrderStatus::Stale => {
                // Still in flight: keep the sweep off its slot, and remove
                // the alert — the hand-off is already durable.
                let _ = self.ledger.refresh(id, Utc::now());
                debug!(alert_id = %id, "order already in flight, refreshed");
                if let Err(e) = self.store.complete(id) {
                    warn!(alert_id = %id, error = %e, "failed to remove in-flight alert record");
                }
                Disposition::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BoxFuture, TradePrimitive};
    use gofer_core::{
        Address, Alert, RpcError, SystemClock, TokenAmount, TradeReceipt,
    };
    use gofer_gate::BalanceOracle;
    use gofer_ledger::StalePolicy;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::fs;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const RETRY: Duration = Duration::from_millis(10);
    const BUDGET: Duration = Duration::from_secs(1);
    const TTL: Duration = Duration::from_secs(600);
    const WARN_INTERVAL: Duration = Duration::from_secs(300);

    /// Balance oracle returning a fixed amount.
    struct StaticBalance(TokenAmount);

    impl BalanceOracle for StaticBalance {
        fn get_balance<'a>(
            &'a self,
            _address: &'a Address,
        ) -> gofer_gate::BoxFuture<'a, Result<TokenAmount, RpcError>> {
            Box::pin(async move { Ok(self.0) })
        }
    }

    /// Price oracle returning a fixed quote, or an error.
    struct StaticPrice(Result<TokenAmount, RpcError>);

    impl PriceOracle for StaticPrice {
        fn get_buy_price<'a>(
            &'a self,
            _quantity: TokenAmount,
        ) -> BoxFuture<'a, Result<TokenAmount, RpcError>> {
            Box::pin(async move { self.0.clone() })
        }
    }

    /// Trade primitive that records calls and can detect slot overlap.
    #[derive(Default)]
    struct RecordingPrimitive {
        calls: Mutex<Vec<(String, String, TokenAmount)>>,
        in_flight: AtomicBool,
        overlap: AtomicBool,
        fail: bool,
    }

    impl RecordingPrimitive {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl TradePrimitive for RecordingPrimitive {
        fn execute<'a>(
            &'a self,
            alert: &'a Alert,
            signer: &'a Address,
            amount: TokenAmount,
        ) -> BoxFuture<'a, Result<TradeReceipt, RpcError>> {
            Box::pin(async move {
                if self.in_flight.swap(true, Ordering::SeqCst) {
                    self.overlap.store(true, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                self.in_flight.store(false, Ordering::SeqCst);

                self.calls.lock().push((
                    alert.id.to_string(),
                    signer.to_string(),
                    amount,
                ));
                if self.fail {
                    Err(RpcError::Node("execution reverted".into()))
                } else {
                    Ok(TradeReceipt {
                        id: format!("0xtx{}", alert.id),
                        simulated: false,
                    })
                }
            })
        }
    }

    struct Harness {
        _dirs: (TempDir, TempDir),
        fleet: Arc<KeyFleet>,
        ledger: Arc<OrderLedger>,
        buy_store: AlertStore,
        sell_store: AlertStore,
        shutdown: CancellationToken,
    }

    impl Harness {
        fn new(pool_size: usize) -> Self {
            let alerts_dir = TempDir::new().unwrap();
            let orders_dir = TempDir::new().unwrap();
            let signers = (0..pool_size)
                .map(|i| Address::new(format!("0xkey{i}")))
                .collect();
            let fleet = Arc::new(KeyFleet::new(signers, RETRY, Arc::new(SystemClock)));
            let ledger = Arc::new(
                OrderLedger::open(
                    orders_dir.path(),
                    Arc::clone(&fleet),
                    WARN_INTERVAL,
                    StalePolicy::Abandon,
                )
                .unwrap(),
            );
            let buy_store = AlertStore::new(alerts_dir.path().join("buy"), Direction::Buy);
            let sell_store = AlertStore::new(alerts_dir.path().join("sell"), Direction::Sell);
            buy_store.ensure_store().unwrap();
            sell_store.ensure_store().unwrap();
            Self {
                _dirs: (alerts_dir, orders_dir),
                fleet,
                ledger,
                buy_store,
                sell_store,
                shutdown: CancellationToken::new(),
            }
        }

        fn write_alert(&self, direction: Direction, id: &str) {
            let store = match direction {
                Direction::Buy => &self.buy_store,
                Direction::Sell => &self.sell_store,
            };
            let body = r#"{"quantity": "10", "holderAddress": "0xHolder", "counterpartyAddress": "0xGamer"}"#;
            fs::write(store.dir().join(format!("{id}.json")), body).unwrap();
        }

        fn gate(&self, balance: TokenAmount) -> BalanceGate {
            BalanceGate::new(Arc::new(StaticBalance(balance)), TTL, Arc::new(SystemClock))
        }

        fn buy_gofer(&self, engine: ExecutionEngine, balance: TokenAmount) -> Gofer {
            Gofer::buy(
                self.buy_store.clone(),
                Arc::clone(&self.fleet),
                Arc::clone(&self.ledger),
                self.gate(balance),
                Arc::new(StaticPrice(Ok(TokenAmount::new(dec!(25))))),
                engine,
                BUDGET,
                self.shutdown.clone(),
            )
        }

        fn sell_gofer(&self, engine: ExecutionEngine, balance: TokenAmount) -> Gofer {
            Gofer::sell(
                self.sell_store.clone(),
                Arc::clone(&self.fleet),
                Arc::clone(&self.ledger),
                self.gate(balance),
                engine,
                BUDGET,
                self.shutdown.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_buy_happy_path() {
        let harness = Harness::new(2);
        harness.write_alert(Direction::Buy, "buy-1");
        let primitive = Arc::new(RecordingPrimitive::default());
        let gofer = harness.buy_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(100)),
        );

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.executed, 1);

        // One execution with the computed buy amount, from slot 0's key.
        let calls = primitive.calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "0xkey0");
        assert_eq!(calls[0].2, TokenAmount::new(dec!(25)));

        // Slot released, one completed ledger entry, alert record removed.
        assert_eq!(harness.fleet.held_count(), 0);
        let order = harness.ledger.get(&AlertId::new("buy-1")).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.computed_amount, TokenAmount::new(dec!(25)));
        assert_eq!(harness.buy_store.list_pending().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sell_insufficient_balance_defers() {
        let harness = Harness::new(2);
        harness.write_alert(Direction::Sell, "sell-1");
        let primitive = Arc::new(RecordingPrimitive::default());
        let gofer = harness.sell_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(1)),
        );

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.deferred, 1);

        // No execution, no ledger entry, slot released, alert retained.
        assert_eq!(primitive.call_count(), 0);
        assert!(harness.ledger.get(&AlertId::new("sell-1")).is_none());
        assert_eq!(harness.fleet.held_count(), 0);
        assert_eq!(harness.sell_store.list_pending().unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_simulation_never_touches_live_primitive() {
        let harness = Harness::new(1);
        harness.write_alert(Direction::Sell, "sell-1");
        let primitive = Arc::new(RecordingPrimitive::default());
        let gofer = harness.sell_gofer(ExecutionEngine::Simulation, TokenAmount::new(dec!(100)));

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.executed, 1);
        assert_eq!(primitive.call_count(), 0);

        // The dummy path still drives the full ledger lifecycle.
        let order = harness.ledger.get(&AlertId::new("sell-1")).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(harness.sell_store.list_pending().unwrap().count(), 0);
        assert_eq!(harness.fleet.held_count(), 0);
    }

    #[tokio::test]
    async fn test_execution_failure_finalizes_failed() {
        let harness = Harness::new(1);
        harness.write_alert(Direction::Sell, "sell-1");
        let primitive = Arc::new(RecordingPrimitive::failing());
        let gofer = harness.sell_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(100)),
        );

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.failed, 1);

        // Order finalized failed, slot released, alert kept for review.
        let order = harness.ledger.get(&AlertId::new("sell-1")).unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(harness.fleet.held_count(), 0);
        assert_eq!(harness.sell_store.list_pending().unwrap().count(), 1);

        // The next scan skips it without re-executing.
        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(primitive.call_count(), 1);
    }

    #[tokio::test]
    async fn test_redelivered_alert_refreshes_in_flight_order() {
        let harness = Harness::new(2);
        harness.write_alert(Direction::Sell, "sell-1");

        // An order for this alert is already in flight (recorded by a
        // previous cycle that crashed before cleanup).
        let id = AlertId::new("sell-1");
        let slot = harness.fleet.acquire(&id, BUDGET).await.unwrap();
        let submitted = Utc::now() - chrono::Duration::minutes(5);
        harness
            .ledger
            .record(PendingOrder::new(
                id.clone(),
                slot,
                Direction::Sell,
                TokenAmount::new(dec!(10)),
                TokenAmount::new(dec!(10)),
                submitted,
            ))
            .unwrap();

        let primitive = Arc::new(RecordingPrimitive::default());
        let gofer = harness.sell_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(100)),
        );

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(primitive.call_count(), 0);

        // Refreshed (staleness clock reset) and the alert record removed.
        let order = harness.ledger.get(&id).unwrap();
        assert!(order.last_refreshed_at > submitted);
        assert_eq!(order.status, OrderStatus::Submitted);
        assert_eq!(harness.sell_store.list_pending().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_price_failure_defers_buy() {
        let harness = Harness::new(1);
        harness.write_alert(Direction::Buy, "buy-1");
        let primitive = Arc::new(RecordingPrimitive::default());
        let gofer = Gofer::buy(
            harness.buy_store.clone(),
            Arc::clone(&harness.fleet),
            Arc::clone(&harness.ledger),
            harness.gate(TokenAmount::new(dec!(100))),
            Arc::new(StaticPrice(Err(RpcError::Timeout(10_000)))),
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            BUDGET,
            harness.shutdown.clone(),
        );

        let stats = gofer.process_alerts().await.unwrap();
        assert_eq!(stats.deferred, 1);
        assert_eq!(primitive.call_count(), 0);
        assert!(harness.ledger.is_empty());
        assert_eq!(harness.fleet.held_count(), 0);
        assert_eq!(harness.buy_store.list_pending().unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_alerts() {
        let harness = Harness::new(1);
        harness.write_alert(Direction::Sell, "sell-1");
        harness.write_alert(Direction::Sell, "sell-2");
        let gofer = harness.sell_gofer(ExecutionEngine::Simulation, TokenAmount::new(dec!(100)));

        harness.shutdown.cancel();
        let stats = gofer.process_alerts().await.unwrap();

        // Nothing processed, nothing lost, no slot left held.
        assert_eq!(stats.executed, 0);
        assert_eq!(harness.sell_store.list_pending().unwrap().count(), 2);
        assert_eq!(harness.fleet.held_count(), 0);
    }

    #[tokio::test]
    async fn test_directions_share_one_slot_pool_without_overlap() {
        let harness = Harness::new(1);
        for i in 0..2 {
            harness.write_alert(Direction::Buy, &format!("buy-{i}"));
            harness.write_alert(Direction::Sell, &format!("sell-{i}"));
        }
        let primitive = Arc::new(RecordingPrimitive::default());
        let buyer = harness.buy_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(100)),
        );
        let seller = harness.sell_gofer(
            ExecutionEngine::Live(Arc::clone(&primitive) as Arc<dyn TradePrimitive>),
            TokenAmount::new(dec!(100)),
        );

        let (buy_stats, sell_stats) =
            tokio::join!(buyer.process_alerts(), seller.process_alerts());
        assert_eq!(buy_stats.unwrap().executed, 2);
        assert_eq!(sell_stats.unwrap().executed, 2);

        // Four executions through one slot, never two at once.
        assert_eq!(primitive.call_count(), 4);
        assert!(!primitive.overlap.load(Ordering::SeqCst));
        assert_eq!(harness.fleet.held_count(), 0);
    }
}
