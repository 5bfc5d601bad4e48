//! Random-forest regressor
//!
//! Bagged CART trees; every feature is a split candidate at every node and
//! the prediction is the mean over trees. Each tree draws its bootstrap
//! sample from its own `StdRng`, seeded from the forest's `random_state`,
//! so fitting is reproducible with or without the `rayon` feature.

use super::tree::{RegressionTree, TreeParams};
use super::Regressor;
use crate::dataset::FeatureMatrix;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: Option<usize>,
    /// Seed for bootstrap sampling
    pub random_state: u64,
    /// Draw a bootstrap sample per tree (otherwise every tree sees all rows)
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            random_state: 42,
            bootstrap: true,
        }
    }
}

/// Fitted random-forest regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fit a forest on `features`/`target`
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if there are no rows, no trees requested,
    /// mismatched lengths, or non-finite values
    pub fn fit(params: ForestParams, features: &FeatureMatrix, target: &[f64]) -> Result<Self> {
        let n = features.num_rows();
        if n == 0 {
            return Err(Error::Computation("cannot fit a forest on zero rows".into()));
        }
        if n != target.len() {
            return Err(Error::Computation(format!(
                "feature rows ({n}) and target length ({}) differ",
                target.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(Error::Computation("n_estimators must be at least 1".into()));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            ..TreeParams::default()
        };

        let mut rng = StdRng::seed_from_u64(params.random_state);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.gen()).collect();

        let rows = features.rows();
        let fit_one = |seed: &u64| -> Result<RegressionTree> {
            let sample: Vec<usize> = if params.bootstrap {
                let mut tree_rng = StdRng::seed_from_u64(*seed);
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            RegressionTree::fit(rows, target, &sample, tree_params)
        };

        #[cfg(feature = "rayon")]
        let trees = {
            use rayon::prelude::*;
            seeds.par_iter().map(fit_one).collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let trees = seeds.iter().map(fit_one).collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            n_estimators = params.n_estimators,
            max_depth = ?params.max_depth,
            rows = n,
            features = features.num_features(),
            "random forest fitted"
        );

        Ok(Self {
            params,
            n_features: features.num_features(),
            trees,
        })
    }

    /// Hyperparameters used for fitting
    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fitted trees
    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Check every tree of a deserialized forest
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if the forest has no trees, a tree's
    /// width differs from the forest's, or a tree arena is malformed
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::Computation("model has no fitted trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(Error::Computation(format!(
                    "tree {i} expects {} features, forest expects {}",
                    tree.n_features(),
                    self.n_features
                )));
            }
            tree.validate()
                .map_err(|e| Error::Computation(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

impl Regressor for RandomForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(Error::Computation(format!(
                "X has {} features, but the model is expecting {} features as input",
                row.len(),
                self.n_features
            )));
        }
        if self.trees.is_empty() {
            return Err(Error::Computation("model has no fitted trees".into()));
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        #[allow(clippy::cast_precision_loss)]
        let prediction = sum / self.trees.len() as f64;

        if prediction.is_finite() {
            Ok(prediction)
        } else {
            Err(Error::Computation(format!(
                "prediction is not finite ({prediction})"
            )))
        }
    }
}
