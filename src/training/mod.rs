//! Model training: separate target, split, fit, evaluate, log
//!
//! Toyota Way Principles:
//! - Jidoka: schema and size problems stop the run before anything is logged
//! - Standardized work: one invocation, one committed run

use crate::dataset::{train_validation_split, Dataset, Split, TARGET_COLUMN};
use crate::experiment::{ModelUri, RunLogger, DEFAULT_ARTIFACT_KEY};
use crate::metrics;
use crate::model::{ForestParams, ModelArtifact, RandomForestRegressor, Regressor, MODEL_FILE_NAME};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Fixed training hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Trees in the forest
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Seed for the split and the forest
    pub random_state: u64,
    /// Share of rows held out for validation
    pub test_fraction: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            random_state: 42,
            test_fraction: 0.2,
        }
    }
}

impl Hyperparameters {
    /// Forest configuration for these hyperparameters
    #[must_use]
    pub const fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: Some(self.max_depth),
            random_state: self.random_state,
            bootstrap: true,
        }
    }
}

/// Output of [`Trainer::prepare`]: the split plus the feature schema
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    split: Split,
    feature_names: Vec<String>,
}

impl PreparedData {
    /// Train/validation partition
    #[must_use]
    pub const fn split(&self) -> &Split {
        &self.split
    }

    /// Feature names in column order
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Rows in the training partition
    #[must_use]
    pub fn train_rows(&self) -> usize {
        self.split.train_rows()
    }

    /// Rows in the validation partition
    #[must_use]
    pub fn validation_rows(&self) -> usize {
        self.split.validation_rows()
    }
}

/// Result of one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Committed run
    pub run_id: String,
    /// Validation RMSE
    pub rmse: f64,
    /// Rows used for fitting
    pub train_rows: usize,
    /// Rows used for evaluation
    pub validation_rows: usize,
    /// Where the logged model can be loaded from
    pub model_uri: ModelUri,
    /// The fitted model as logged
    pub artifact: ModelArtifact,
}

/// Random-forest trainer for the `RUL` target
#[derive(Debug, Clone, PartialEq)]
pub struct Trainer {
    hyperparameters: Hyperparameters,
    target: String,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(Hyperparameters::default())
    }
}

impl Trainer {
    /// Trainer predicting [`TARGET_COLUMN`]
    #[must_use]
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            hyperparameters,
            target: TARGET_COLUMN.to_string(),
        }
    }

    /// Hyperparameters in use
    #[must_use]
    pub const fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Separate the target and split the rows
    ///
    /// # Errors
    /// Returns [`crate::Error::InputSchema`] if the target is missing or a
    /// column is unusable, [`crate::Error::InsufficientRows`] if either
    /// partition would be empty
    pub fn prepare(&self, dataset: &Dataset) -> Result<PreparedData> {
        let (features, target) = dataset.split_target(&self.target)?;
        let feature_names = features.names().to_vec();
        let split = train_validation_split(
            &features,
            &target,
            self.hyperparameters.test_fraction,
            self.hyperparameters.random_state,
        )?;

        tracing::info!(
            rows = dataset.num_rows(),
            features = feature_names.len(),
            train_rows = split.train_rows(),
            validation_rows = split.validation_rows(),
            "data prepared"
        );
        Ok(PreparedData {
            split,
            feature_names,
        })
    }

    /// Fit on the training rows and score the validation rows
    ///
    /// # Errors
    /// Returns [`crate::Error::Computation`] if fitting or scoring fails
    pub fn fit(&self, data: &PreparedData) -> Result<(ModelArtifact, f64)> {
        let split = &data.split;
        let forest = RandomForestRegressor::fit(
            self.hyperparameters.forest_params(),
            &split.train_features,
            &split.train_target,
        )?;
        let predictions = forest.predict(split.validation_features.rows())?;
        let rmse = metrics::rmse(&split.validation_target, &predictions)?;

        let artifact = ModelArtifact::new(forest, data.feature_names.clone(), &self.target);
        Ok((artifact, rmse))
    }

    /// Fit, evaluate and commit one run to `logger`
    ///
    /// The run carries params `n_estimators` and `max_depth`, metric `rmse`
    /// and the `model` artifact.
    ///
    /// # Errors
    /// Returns error if fitting fails or the run cannot be logged
    pub fn fit_and_log<L: RunLogger + ?Sized>(
        &self,
        data: PreparedData,
        logger: &mut L,
    ) -> Result<TrainingOutcome> {
        let (artifact, rmse) = self.fit(&data)?;

        let mut run = logger.start_run();
        run.log_param("n_estimators", self.hyperparameters.n_estimators);
        run.log_param("max_depth", self.hyperparameters.max_depth);
        run.log_metric("rmse", rmse);
        run.log_artifact(DEFAULT_ARTIFACT_KEY, MODEL_FILE_NAME, artifact.to_json_bytes()?);
        let logged = logger.log_run(run)?;

        tracing::info!(run_id = %logged.run_id(), rmse, "model trained");
        Ok(TrainingOutcome {
            run_id: logged.run_id().to_string(),
            rmse,
            train_rows: data.train_rows(),
            validation_rows: data.validation_rows(),
            model_uri: ModelUri::for_run(logged.run_id(), DEFAULT_ARTIFACT_KEY),
            artifact,
        })
    }

    /// [`Self::prepare`] followed by [`Self::fit_and_log`]
    ///
    /// # Errors
    /// Returns the first error of either stage; nothing is logged on failure
    pub fn train<L: RunLogger + ?Sized>(
        &self,
        dataset: &Dataset,
        logger: &mut L,
    ) -> Result<TrainingOutcome> {
        let data = self.prepare(dataset)?;
        self.fit_and_log(data, logger)
    }
}
