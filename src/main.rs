// src/main.rs

use anyhow::Result;
use car_pilot::session;
use car_pilot::types::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "car_pilot={},ort=warn",
            config.logging.level
        )))
        .init();

    info!("🚗 Robotic car session starting");
    info!("✓ Configuration loaded from {config_path}");

    session::run_session(config)
}
