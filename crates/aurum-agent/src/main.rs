//! Aurum treasury-rebalancing agent - entry point.
//!
//! Polls a market-sentiment signal and rebalances the AurumVault between
//! risk-on and risk-off allocations via `executeRebalance(bool)`.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Aurum treasury-rebalancing agent
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via AURUM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    aurum_agent::logging::init_logging();

    info!("Starting Aurum agent v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > AURUM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("AURUM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = aurum_agent::AgentConfig::from_file(&config_path)?;
    info!(
        poll_interval_secs = config.poll_interval_secs,
        chain_id = config.chain.chain_id,
        vault = %config.chain.vault_address,
        "Configuration loaded"
    );

    let app = aurum_agent::Application::new(config)?;
    app.run().await?;

    Ok(())
}
