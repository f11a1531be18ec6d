//! AQI Hub - Main Entry Point

use api::config::AppConfig;
use api::{init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(None)?;
    init_logging(&config.logging)?;

    info!("=== AQI Hub v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting air-quality monitoring server...");

    run_server(config).await
}
