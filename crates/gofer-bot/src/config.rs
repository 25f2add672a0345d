//! Application configuration.

use crate::error::{AppError, AppResult};
use gofer_ledger::StalePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration.
///
/// Every field has a default so a partial TOML file (or none at all)
/// still yields a runnable simulation setup; `validate` catches the
/// combinations that cannot work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Route execution through the logging simulation path instead of the
    /// live trade primitive.
    #[serde(default)]
    pub simulation: bool,

    /// JSON-RPC endpoint. Opaque to the core.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Trade contract address. Opaque to the core.
    #[serde(default)]
    pub contract_address: String,

    /// Token contract address for balance queries.
    #[serde(default)]
    pub token_address: String,

    /// Token decimals for base-unit scaling. Default: 18.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,

    /// Gas limit for buy transactions. Passed through unchanged.
    #[serde(default = "default_gas_limit")]
    pub buy_gas_limit: u64,

    /// Gas limit for sell transactions. Passed through unchanged.
    #[serde(default = "default_gas_limit")]
    pub sell_gas_limit: u64,

    /// Signer addresses, one per key slot. The pool size is this list's
    /// length; both direction workers share the pool.
    #[serde(default)]
    pub signer_addresses: Vec<String>,

    /// Directory of durable buy alerts.
    #[serde(default = "default_buy_alert_dir")]
    pub buy_alert_dir: String,

    /// Directory of durable sell alerts.
    #[serde(default = "default_sell_alert_dir")]
    pub sell_alert_dir: String,

    /// Directory of durable pending-order records.
    #[serde(default = "default_order_dir")]
    pub order_dir: String,

    /// Minutes without a refresh before a buy order is considered stale.
    #[serde(default = "default_stale_order_minutes")]
    pub stale_buy_order_minutes: u64,

    /// Minutes without a refresh before a sell order is considered stale.
    #[serde(default = "default_stale_order_minutes")]
    pub stale_sell_order_minutes: u64,

    /// Rate limit for per-order staleness warnings.
    #[serde(default = "default_warning_log_interval_minutes")]
    pub warning_log_interval_minutes: u64,

    /// Backoff between key-slot acquisition attempts.
    #[serde(default = "default_slot_acquire_retry_interval_ms")]
    pub slot_acquire_retry_interval_ms: u64,

    /// Total budget for one slot acquisition before the alert is
    /// deferred to the next cycle.
    #[serde(default = "default_slot_acquire_budget_ms")]
    pub slot_acquire_budget_ms: u64,

    /// Lifetime of a cached negative balance result.
    #[serde(default = "default_low_bal_cache_ttl_minutes")]
    pub low_bal_cache_ttl_minutes: u64,

    /// Interval between queue scans per direction.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Interval between staleness sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Per-request timeout for RPC calls.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Disposition of orders the sweep marks stale.
    #[serde(default)]
    pub stale_order_policy: StalePolicy,
}

fn default_provider_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_token_decimals() -> u32 {
    18
}

fn default_gas_limit() -> u64 {
    200_000
}

fn default_buy_alert_dir() -> String {
    "data/alerts/buy".to_string()
}

fn default_sell_alert_dir() -> String {
    "data/alerts/sell".to_string()
}

fn default_order_dir() -> String {
    "data/orders".to_string()
}

fn default_stale_order_minutes() -> u64 {
    10
}

fn default_warning_log_interval_minutes() -> u64 {
    5
}

fn default_slot_acquire_retry_interval_ms() -> u64 {
    1_000
}

fn default_slot_acquire_budget_ms() -> u64 {
    30_000
}

fn default_low_bal_cache_ttl_minutes() -> u64 {
    10
}

fn default_scan_interval_ms() -> u64 {
    5_000
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: false,
            provider_url: default_provider_url(),
            contract_address: String::new(),
            token_address: String::new(),
            token_decimals: default_token_decimals(),
            buy_gas_limit: default_gas_limit(),
            sell_gas_limit: default_gas_limit(),
            signer_addresses: Vec::new(),
            buy_alert_dir: default_buy_alert_dir(),
            sell_alert_dir: default_sell_alert_dir(),
            order_dir: default_order_dir(),
            stale_buy_order_minutes: default_stale_order_minutes(),
            stale_sell_order_minutes: default_stale_order_minutes(),
            warning_log_interval_minutes: default_warning_log_interval_minutes(),
            slot_acquire_retry_interval_ms: default_slot_acquire_retry_interval_ms(),
            slot_acquire_budget_ms: default_slot_acquire_budget_ms(),
            low_bal_cache_ttl_minutes: default_low_bal_cache_ttl_minutes(),
            scan_interval_ms: default_scan_interval_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            stale_order_policy: StalePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: `GOFER_CONFIG` env var, or the default path.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("GOFER_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| AppError::Config(format!("failed to parse config: {e}")))
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> AppResult<()> {
        if self.signer_addresses.is_empty() {
            return Err(AppError::Config(
                "signer_addresses must name at least one key slot".to_string(),
            ));
        }
        if !self.simulation && (self.contract_address.is_empty() || self.token_address.is_empty()) {
            return Err(AppError::Config(
                "contract_address and token_address are required outside simulation".to_string(),
            ));
        }
        if self.scan_interval_ms == 0 || self.sweep_interval_ms == 0 {
            return Err(AppError::Config(
                "scan_interval_ms and sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.slot_acquire_retry_interval_ms == 0 {
            return Err(AppError::Config(
                "slot_acquire_retry_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn slot_acquire_retry_interval(&self) -> Duration {
        Duration::from_millis(self.slot_acquire_retry_interval_ms)
    }

    pub fn slot_acquire_budget(&self) -> Duration {
        Duration::from_millis(self.slot_acquire_budget_ms)
    }

    pub fn low_bal_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.low_bal_cache_ttl_minutes * 60)
    }

    pub fn warning_log_interval(&self) -> Duration {
        Duration::from_secs(self.warning_log_interval_minutes * 60)
    }

    pub fn stale_threshold(&self, direction: gofer_core::Direction) -> Duration {
        let minutes = match direction {
            gofer_core::Direction::Buy => self.stale_buy_order_minutes,
            gofer_core::Direction::Sell => self.stale_sell_order_minutes,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
