//! Tiered-ladder market maker - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Tiered-ladder market maker
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LADDER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > LADDER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("LADDER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = ladder_bot::AppConfig::from_file(&config_path)?;

    ladder_telemetry::init_logging(&config.telemetry.log_level)?;
    info!("Starting ladder-bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        instrument = %config.instrument(),
        tiers = config.strategy.tier_count(),
        order_size_usd = %config.strategy.order_size_usd,
        "Configuration loaded"
    );

    let app = ladder_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
