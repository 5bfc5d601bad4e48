//! Regression models and their on-disk artifact
//!
//! ## Model family
//!
//! ```text
//! RandomForestRegressor ──< RegressionTree (N, bagged)
//!                               └── Node arena (Leaf | Split)
//! ```
//!
//! Inference goes through the [`Regressor`] trait so the serving layer never
//! depends on the concrete model type.

mod artifact;
pub mod forest;
pub mod tree;

pub use artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION, MODEL_FILE_NAME};
pub use forest::{ForestParams, RandomForestRegressor};
pub use tree::{Node, RegressionTree, TreeParams};

use crate::Result;

/// Read-only inference over fixed-width feature rows
///
/// Implementations must be safe to share across request handlers.
pub trait Regressor: Send + Sync {
    /// Number of features each row must carry
    fn n_features(&self) -> usize;

    /// Predict one row
    ///
    /// # Errors
    /// Returns an error if the row width is wrong or the model is malformed
    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    /// Predict many rows
    ///
    /// # Errors
    /// Returns the first per-row error
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}
