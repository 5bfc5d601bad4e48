//! Train the RUL model once and log it to the tracking store
//!
//! Environment: `DATA_PATH`, `TRACKING_DIR`, `EXPERIMENT_NAME`,
//! `MODEL_EXPORT_PATH` (default `models/latest_model`, `none` to skip),
//! `RUST_LOG`.

use anyhow::Context;
use maintenance_ml::config::TrainConfig;
use maintenance_ml::dataset::Dataset;
use maintenance_ml::experiment::FileTracker;
use maintenance_ml::telemetry;
use maintenance_ml::training::Trainer;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = TrainConfig::from_env();

    let dataset = Dataset::load(&config.data_path)?;
    let mut tracker = FileTracker::open(&config.tracking_dir, &config.experiment_name)
        .context("failed to open tracking store")?;

    let outcome = Trainer::default().train(&dataset, &mut tracker)?;

    config
        .export_model(&outcome.artifact)
        .context("failed to export model")?;

    tracing::info!(run_id = %outcome.run_id, model_uri = %outcome.model_uri, "run committed");
    println!("Validation RMSE: {:.4}", outcome.rmse);
    Ok(())
}
