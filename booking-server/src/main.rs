use anyhow::Context;
use booking_server::{Config, Server, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _log_guard = init_logger(&config.log_level, config.log_json, config.log_dir.as_deref());

    tracing::info!(environment = %config.environment, "Starting booking-server");
    if config.is_development() {
        tracing::warn!("Development mode: unset JWT and PayPal secrets fall back to local values");
    }

    Server::new(config).run().await.context("Server failed")?;
    Ok(())
}
