//! Run the two-task training pipeline
//!
//! Environment: `DATA_PATH`, `TRACKING_DIR`, `EXPERIMENT_NAME`,
//! `MODEL_EXPORT_PATH` (default `models/latest_model`, `none` to skip),
//! `RUST_LOG`.

use anyhow::Context;
use maintenance_ml::config::TrainConfig;
use maintenance_ml::experiment::FileTracker;
use maintenance_ml::pipeline::TrainingPipeline;
use maintenance_ml::telemetry;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = TrainConfig::from_env();

    let mut tracker = FileTracker::open(&config.tracking_dir, &config.experiment_name)
        .context("failed to open tracking store")?;
    let run = TrainingPipeline::default().execute(&config.data_path, &mut tracker);
    if let Some(task) = run.failed_task() {
        tracing::error!(task = task.name(), error = task.error(), "pipeline aborted");
    }
    let outcome = run.into_outcome()?;
    config
        .export_model(&outcome.training.artifact)
        .context("failed to export model")?;

    println!(
        "Model training completed with RMSE: {:.4}",
        outcome.validation_rmse
    );
    Ok(())
}
