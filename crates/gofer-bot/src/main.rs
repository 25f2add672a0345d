//! Gofer trade execution bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Alert-driven token trade execution bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GOFER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    gofer_telemetry::init_logging()?;

    info!("starting gofer bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > GOFER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GOFER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "loading configuration");

    let config = if std::path::Path::new(&config_path).exists() {
        gofer_bot::AppConfig::from_file(&config_path)?
    } else {
        tracing::warn!(path = %config_path, "config file not found, using defaults");
        gofer_bot::AppConfig::default()
    };
    info!(
        simulation = config.simulation,
        provider_url = %config.provider_url,
        fleet_size = config.signer_addresses.len(),
        "configuration loaded"
    );

    let app = gofer_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
