//! Data drift reporting
//!
//! Compares every numeric column shared by a reference and a current
//! dataset with a per-column statistical test, then summarises the share of
//! drifted columns into a dataset-level verdict.
//!
//! ```rust
//! use maintenance_ml::dataset::Dataset;
//! use maintenance_ml::monitoring::generate_drift_report;
//!
//! let reference = Dataset::from_columns(vec![("feature_1", vec![1.0, 2.0, 3.0, 4.0])])?;
//! let report = generate_drift_report(&reference, &reference)?;
//! assert_eq!(report.number_of_drifted_columns, 0);
//! assert!(!report.dataset_drift);
//! # Ok::<(), maintenance_ml::Error>(())
//! ```

mod stattests;

pub use stattests::{
    DriftMethod, DriftTest, KolmogorovSmirnov, PopulationStability, Wasserstein,
    AUTO_KS_MAX_ROWS,
};

use crate::dataset::Dataset;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default share of drifted columns that flags the whole dataset
pub const DEFAULT_DATASET_DRIFT_SHARE: f64 = 0.5;

/// How a drift report is computed
#[derive(Debug, Clone)]
pub struct DriftOptions {
    method: DriftMethod,
    test: Option<Arc<dyn DriftTest>>,
    drift_share: f64,
}

impl Default for DriftOptions {
    fn default() -> Self {
        Self {
            method: DriftMethod::Auto,
            test: None,
            drift_share: DEFAULT_DATASET_DRIFT_SHARE,
        }
    }
}

impl DriftOptions {
    /// Options using a built-in method
    #[must_use]
    pub fn with_method(method: DriftMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Options using a caller-supplied test for every column
    #[must_use]
    pub fn with_test(test: Arc<dyn DriftTest>) -> Self {
        Self {
            test: Some(test),
            ..Self::default()
        }
    }

    /// Set the drifted-column share that flags the dataset
    #[must_use]
    pub fn drift_share(mut self, share: f64) -> Self {
        self.drift_share = share;
        self
    }

    /// Built-in method (ignored when a custom test is set)
    #[must_use]
    pub const fn method(&self) -> DriftMethod {
        self.method
    }

    fn test_for(&self, reference_rows: usize) -> Arc<dyn DriftTest> {
        self.test
            .clone()
            .unwrap_or_else(|| self.method.test_for(reference_rows))
    }
}

/// Drift verdict for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    /// Column name
    pub column: String,
    /// Test that produced the score
    pub stattest: String,
    /// Test score (p-value for `ks`, distance or index otherwise)
    pub drift_score: f64,
    /// Threshold the score was compared against
    pub threshold: f64,
    /// Whether the column drifted
    pub drift_detected: bool,
    /// Non-null reference values
    pub reference_count: usize,
    /// Non-null current values
    pub current_count: usize,
}

/// Dataset-level drift summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Per-column results, in reference column order
    pub columns: Vec<ColumnDrift>,
    /// Columns tested
    pub number_of_columns: usize,
    /// Columns flagged as drifted
    pub number_of_drifted_columns: usize,
    /// `number_of_drifted_columns / number_of_columns` (0 when nothing was tested)
    pub share_of_drifted_columns: f64,
    /// Share threshold for the dataset verdict
    pub drift_share: f64,
    /// True when the drifted share reaches `drift_share`
    pub dataset_drift: bool,
    /// Rows in the reference dataset
    pub reference_rows: usize,
    /// Rows in the current dataset
    pub current_rows: usize,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl DriftReport {
    /// Result for one column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDrift> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Names of drifted columns
    #[must_use]
    pub fn drifted_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.drift_detected)
            .map(|c| c.column.as_str())
            .collect()
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to `path`, creating parent directories
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Drift report with default options
///
/// # Errors
/// Returns [`Error::Computation`] if a shared column has no non-null values
pub fn generate_drift_report(current: &Dataset, reference: &Dataset) -> Result<DriftReport> {
    generate_drift_report_with(current, reference, &DriftOptions::default())
}

/// Drift report with explicit options
///
/// Columns must be numeric in both datasets to be tested; others are
/// skipped. Nulls and non-finite values are dropped per column.
///
/// # Errors
/// Returns [`Error::Computation`] if a shared column has no usable values
/// on either side, or if a test fails
#[allow(clippy::cast_precision_loss)]
pub fn generate_drift_report_with(
    current: &Dataset,
    reference: &Dataset,
    options: &DriftOptions,
) -> Result<DriftReport> {
    let shared = reference.shared_numeric_columns(current);
    for name in reference.column_names() {
        if current.column_names().contains(&name) && !shared.contains(&name) {
            tracing::debug!(column = %name, "skipping non-numeric column");
        }
    }

    let mut columns = Vec::with_capacity(shared.len());
    for name in &shared {
        let reference_values = usable_values(reference, name, "reference")?;
        let current_values = usable_values(current, name, "current")?;

        let test = options.test_for(reference_values.len());
        let score = test.score(&reference_values, &current_values)?;
        let drift_detected = test.is_drift(score);
        tracing::debug!(column = %name, stattest = test.name(), score, drift_detected, "column tested");

        columns.push(ColumnDrift {
            column: name.clone(),
            stattest: test.name().to_string(),
            drift_score: score,
            threshold: test.threshold(),
            drift_detected,
            reference_count: reference_values.len(),
            current_count: current_values.len(),
        });
    }

    let number_of_columns = columns.len();
    let number_of_drifted_columns = columns.iter().filter(|c| c.drift_detected).count();
    let share_of_drifted_columns = if number_of_columns == 0 {
        0.0
    } else {
        number_of_drifted_columns as f64 / number_of_columns as f64
    };
    let dataset_drift = number_of_columns > 0 && share_of_drifted_columns >= options.drift_share;

    tracing::info!(
        columns = number_of_columns,
        drifted = number_of_drifted_columns,
        dataset_drift,
        "drift report generated"
    );

    Ok(DriftReport {
        columns,
        number_of_columns,
        number_of_drifted_columns,
        share_of_drifted_columns,
        drift_share: options.drift_share,
        dataset_drift,
        reference_rows: reference.num_rows(),
        current_rows: current.num_rows(),
        generated_at: Utc::now(),
    })
}

fn usable_values(dataset: &Dataset, column: &str, side: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = dataset
        .nullable_column(column)?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return Err(Error::Computation(format!(
            "column '{column}' has no non-null values in the {side} dataset"
        )));
    }
    Ok(values)
}
