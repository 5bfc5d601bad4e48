//! Serialized model artifact (`model.json`)

use super::{RandomForestRegressor, Regressor};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Artifact schema version written by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File name of the artifact inside an artifact directory
pub const MODEL_FILE_NAME: &str = "model.json";

/// A fitted model plus the schema it expects
///
/// The artifact is self-describing: it names the feature columns in the
/// order rows must present them, and the target it predicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    format_version: u32,
    feature_names: Vec<String>,
    target: String,
    model: RandomForestRegressor,
}

impl ModelArtifact {
    /// Wrap a fitted forest
    #[must_use]
    pub fn new(
        model: RandomForestRegressor,
        feature_names: Vec<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names,
            target: target.into(),
            model,
        }
    }

    /// Schema version this artifact was written with
    #[must_use]
    pub const fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Feature names in training column order
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Target column name
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The fitted forest
    #[must_use]
    pub const fn model(&self) -> &RandomForestRegressor {
        &self.model
    }

    /// Serialize to JSON bytes
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes
    ///
    /// # Errors
    /// Returns error on malformed JSON, an unsupported format version, or a
    /// forest whose trees are malformed
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = serde_json::from_slice(bytes)?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::Computation(format!(
                "unsupported artifact format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        artifact.model.validate()?;
        Ok(artifact)
    }

    /// Resolve a path to the artifact file: a directory means `<dir>/model.json`
    #[must_use]
    pub fn file_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(MODEL_FILE_NAME)
        } else {
            path.to_path_buf()
        }
    }

    /// Load an artifact from a file or artifact directory
    ///
    /// # Errors
    /// Returns [`Error::ModelLoad`] if the file is missing or malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::file_path(path);
        let bytes =
            std::fs::read(&file).map_err(|e| Error::model_load(file.display().to_string(), e))?;
        Self::from_json_slice(&bytes).map_err(|e| Error::model_load(file.display().to_string(), e))
    }

    /// Write the artifact into `dir/model.json`, creating `dir`
    ///
    /// # Errors
    /// Returns error if the directory or file cannot be written
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let file = dir.join(MODEL_FILE_NAME);
        std::fs::write(&file, self.to_json_bytes()?)?;
        Ok(file)
    }
}

impl Regressor for ModelArtifact {
    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        self.model.predict_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureMatrix;
    use crate::model::ForestParams;

    fn tiny_artifact() -> ModelArtifact {
        let features = FeatureMatrix::new(
            vec!["x".into()],
            (0..10).map(|i| vec![f64::from(i)]).collect(),
        )
        .unwrap();
        let target: Vec<f64> = (0..10).map(f64::from).collect();
        let params = ForestParams {
            n_estimators: 2,
            max_depth: Some(2),
            ..ForestParams::default()
        };
        let model = RandomForestRegressor::fit(params, &features, &target).unwrap();
        ModelArtifact::new(model, vec!["x".into()], "RUL")
    }

    #[test]
    fn test_artifact_save_and_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = tiny_artifact();

        let file = artifact.save_to_dir(dir.path().join("latest_model")).unwrap();
        assert!(file.ends_with(MODEL_FILE_NAME));

        let from_dir = ModelArtifact::load(dir.path().join("latest_model")).unwrap();
        let from_file = ModelArtifact::load(&file).unwrap();
        assert_eq!(from_dir, artifact);
        assert_eq!(from_file, artifact);
        assert_eq!(from_dir.target(), "RUL");
    }

    #[test]
    fn test_artifact_load_missing_is_model_load() {
        let err = ModelArtifact::load("/nonexistent/models/latest_model").unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
    }

    #[test]
    fn test_artifact_rejects_future_version() {
        let mut json = serde_json::to_value(tiny_artifact()).unwrap();
        json["format_version"] = serde_json::json!(99);
        let bytes = serde_json::to_vec(&json).unwrap();

        let err = ModelArtifact::from_json_slice(&bytes).unwrap_err();
        assert!(err.to_string().contains("format version 99"));
    }

    #[test]
    fn test_artifact_rejects_cyclic_tree() {
        let mut json = serde_json::to_value(tiny_artifact()).unwrap();
        assert_eq!(json["model"]["trees"][0]["nodes"][0]["kind"], "split");
        json["model"]["trees"][0]["nodes"][0]["left"] = serde_json::json!(0);
        let bytes = serde_json::to_vec(&json).unwrap();

        let err = ModelArtifact::from_json_slice(&bytes).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
        assert!(err.to_string().contains("tree 0"));

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE_NAME), &bytes).unwrap();
        let err = ModelArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
    }
}
