//! Serve RUL predictions over HTTP
//!
//! Environment: `MODEL_PATH`, `TRACKING_DIR`, `EXPERIMENT_NAME`, `HOST`,
//! `PORT`, `RUST_LOG`. Exits non-zero if the model cannot be loaded.

use anyhow::Context;
use maintenance_ml::config::ServeConfig;
use maintenance_ml::{serving, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = ServeConfig::from_env().context("invalid service configuration")?;
    tracing::info!(model = %config.model_uri, "Predictive Maintenance Model API starting");

    serving::serve(config).await?;
    Ok(())
}
