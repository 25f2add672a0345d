//! Main application for the gofer trade execution bot.
//!
//! Wires the shared key fleet and order ledger to the two direction
//! workers, and drives their scan cycles and the staleness sweep on
//! independent timers until shutdown.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
