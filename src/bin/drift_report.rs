//! Compare a current dataset against a reference and report drift
//!
//! Environment: `REFERENCE_DATA_PATH`, `CURRENT_DATA_PATH`, `DRIFT_METHOD`,
//! `DRIFT_REPORT_PATH` (stdout if unset), `RUST_LOG`.

use anyhow::Context;
use maintenance_ml::config::DriftConfig;
use maintenance_ml::dataset::Dataset;
use maintenance_ml::monitoring::{generate_drift_report_with, DriftOptions};
use maintenance_ml::telemetry;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = DriftConfig::from_env().context("invalid drift configuration")?;

    let reference = Dataset::load(&config.reference_path)?;
    let current = Dataset::load(&config.current_path)?;
    let report = generate_drift_report_with(
        &current,
        &reference,
        &DriftOptions::with_method(config.method),
    )?;

    match &config.output_path {
        Some(path) => {
            report.save(path)?;
            tracing::info!(path = %path.display(), "drift report written");
        }
        None => println!("{}", report.to_json()?),
    }

    tracing::info!(
        drifted = report.number_of_drifted_columns,
        columns = report.number_of_columns,
        dataset_drift = report.dataset_drift,
        "drift check finished"
    );
    Ok(())
}
