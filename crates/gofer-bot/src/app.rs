//! Main application orchestration.
//!
//! Builds the shared key fleet and order ledger, one worker per trade
//! direction, and runs their scan cycles plus the staleness sweep on
//! independent timers until a shutdown signal arrives.

use crate::config::AppConfig;
use crate::error::AppResult;
use chrono::Utc;
use gofer_alerts::AlertStore;
use gofer_chain::{ChainBalanceOracle, ChainPriceOracle, ChainTradePrimitive, RpcClient};
use gofer_core::{Address, Clock, Direction, SystemClock};
use gofer_exec::{ExecutionEngine, Gofer, PriceOracle, TradePrimitive};
use gofer_fleet::KeyFleet;
use gofer_gate::{BalanceGate, BalanceOracle};
use gofer_ledger::OrderLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run until ctrl-c. Shutdown stops every worker between alerts;
    /// unprocessed alert records stay durable for the next start.
    pub async fn run(self) -> AppResult<()> {
        let config = &self.config;
        let shutdown = CancellationToken::new();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let signers: Vec<Address> = config
            .signer_addresses
            .iter()
            .map(|s| Address::new(s.as_str()))
            .collect();
        let fleet = Arc::new(KeyFleet::new(
            signers,
            config.slot_acquire_retry_interval(),
            Arc::clone(&clock),
        ));
        let ledger = Arc::new(OrderLedger::open(
            &config.order_dir,
            Arc::clone(&fleet),
            config.warning_log_interval(),
            config.stale_order_policy,
        )?);

        let rpc = Arc::new(RpcClient::new(&config.provider_url, config.rpc_timeout())?);
        let balance_oracle: Arc<dyn BalanceOracle> = Arc::new(ChainBalanceOracle::new(
            Arc::clone(&rpc),
            Address::new(config.token_address.as_str()),
            config.token_decimals,
        ));
        let price_oracle: Arc<dyn PriceOracle> = Arc::new(ChainPriceOracle::new(
            Arc::clone(&rpc),
            Address::new(config.contract_address.as_str()),
            config.token_decimals,
        ));
        let engine = if config.simulation {
            info!("simulation mode: trades will be logged, not submitted");
            ExecutionEngine::Simulation
        } else {
            let primitive: Arc<dyn TradePrimitive> = Arc::new(ChainTradePrimitive::new(
                Arc::clone(&rpc),
                Address::new(config.contract_address.as_str()),
                config.buy_gas_limit,
                config.sell_gas_limit,
                config.token_decimals,
            ));
            ExecutionEngine::Live(primitive)
        };

        let buy_gofer = Gofer::buy(
            AlertStore::new(&config.buy_alert_dir, Direction::Buy),
            Arc::clone(&fleet),
            Arc::clone(&ledger),
            BalanceGate::new(
                Arc::clone(&balance_oracle),
                config.low_bal_cache_ttl(),
                Arc::clone(&clock),
            ),
            price_oracle,
            engine.clone(),
            config.slot_acquire_budget(),
            shutdown.clone(),
        );
        let sell_gofer = Gofer::sell(
            AlertStore::new(&config.sell_alert_dir, Direction::Sell),
            Arc::clone(&fleet),
            Arc::clone(&ledger),
            BalanceGate::new(
                Arc::clone(&balance_oracle),
                config.low_bal_cache_ttl(),
                Arc::clone(&clock),
            ),
            engine,
            config.slot_acquire_budget(),
            shutdown.clone(),
        );

        info!(
            fleet_size = fleet.size(),
            simulation = config.simulation,
            "starting direction workers"
        );

        let tasks: Vec<JoinHandle<()>> = vec![
            tokio::spawn(scan_loop(buy_gofer, config.scan_interval(), shutdown.clone())),
            tokio::spawn(scan_loop(
                sell_gofer,
                config.scan_interval(),
                shutdown.clone(),
            )),
            tokio::spawn(sweep_loop(
                Arc::clone(&ledger),
                config.stale_threshold(Direction::Buy),
                config.stale_threshold(Direction::Sell),
                config.sweep_interval(),
                shutdown.clone(),
            )),
        ];

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
        }
        shutdown.cancel();

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
        info!("shutdown complete");
        Ok(())
    }
}

/// Drive one direction worker on a timer until cancellation.
async fn scan_loop(gofer: Gofer, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match gofer.process_alerts().await {
                    Ok(stats) if stats.scanned > 0 => info!(
                        direction = %gofer.direction(),
                        scanned = stats.scanned,
                        executed = stats.executed,
                        deferred = stats.deferred,
                        skipped = stats.skipped,
                        failed = stats.failed,
                        "scan cycle complete"
                    ),
                    Ok(_) => {}
                    Err(e) => warn!(direction = %gofer.direction(), error = %e, "scan cycle failed"),
                }
            }
        }
    }
}

/// Reclaim slots from stale orders on a timer until cancellation.
async fn sweep_loop(
    ledger: Arc<OrderLedger>,
    buy_threshold: Duration,
    sell_threshold: Duration,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let now = Utc::now();
                let mut swept = ledger.sweep_stale(now, buy_threshold, Direction::Buy);
                swept.extend(ledger.sweep_stale(now, sell_threshold, Direction::Sell));
                if !swept.is_empty() {
                    info!(count = swept.len(), "stale orders reclaimed");
                }
            }
        }
    }
}
