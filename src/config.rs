//! Configuration module
//!
//! Every entry point is configured through environment variables (a `.env`
//! file is honoured by the binaries via `dotenvy`). The `from_lookup`
//! constructors take any key lookup so tests never touch process env.

use crate::experiment::ModelUri;
use crate::model::ModelArtifact;
use crate::monitoring::DriftMethod;
use crate::{Error, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default training dataset
pub const DEFAULT_DATA_PATH: &str = "data/maintenance_data.csv";
/// Default model location for the prediction service
pub const DEFAULT_MODEL_PATH: &str = "models/latest_model";
/// Default tracking store root
pub const DEFAULT_TRACKING_DIR: &str = "mlruns";
/// Default experiment name
pub const DEFAULT_EXPERIMENT_NAME: &str = "predictive-maintenance";
/// `MODEL_EXPORT_PATH` value that turns the model export off
pub const EXPORT_DISABLED: &str = "none";

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Training / pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainConfig {
    /// Dataset to train on (`DATA_PATH`)
    pub data_path: PathBuf,
    /// Tracking store root (`TRACKING_DIR`)
    pub tracking_dir: PathBuf,
    /// Experiment runs are logged under (`EXPERIMENT_NAME`)
    pub experiment_name: String,
    /// Directory the fitted model is also written to (`MODEL_EXPORT_PATH`)
    ///
    /// Defaults to [`DEFAULT_MODEL_PATH`] so the service's default location
    /// always holds the latest trained model. `none` disables the export.
    pub export_path: Option<PathBuf>,
}

impl TrainConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_path: lookup("DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            tracking_dir: lookup("TRACKING_DIR")
                .unwrap_or_else(|| DEFAULT_TRACKING_DIR.to_string())
                .into(),
            experiment_name: lookup("EXPERIMENT_NAME")
                .unwrap_or_else(|| DEFAULT_EXPERIMENT_NAME.to_string()),
            export_path: match lookup("MODEL_EXPORT_PATH") {
                Some(raw) if raw.eq_ignore_ascii_case(EXPORT_DISABLED) => None,
                Some(raw) => Some(raw.into()),
                None => Some(DEFAULT_MODEL_PATH.into()),
            },
        }
    }

    /// Write `artifact` to the export directory, if one is configured
    ///
    /// Returns the written `model.json` path.
    ///
    /// # Errors
    /// Returns error if the export directory or file cannot be written
    pub fn export_model(&self, artifact: &ModelArtifact) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.export_path else {
            return Ok(None);
        };
        let file = artifact.save_to_dir(dir)?;
        tracing::info!(path = %file.display(), "model exported");
        Ok(Some(file))
    }
}

/// Prediction service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Model location (`MODEL_PATH`): path, `runs:/<id>` or `runs:/latest`
    pub model_uri: ModelUri,
    /// Tracking store root used for `runs:/` URIs (`TRACKING_DIR`)
    pub tracking_dir: PathBuf,
    /// Experiment used for `runs:/` URIs (`EXPERIMENT_NAME`)
    pub experiment_name: String,
    /// Bind host (`HOST`)
    pub host: String,
    /// Bind port (`PORT`)
    pub port: u16,
}

impl ServeConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns error if `PORT` is not a valid port number
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns error if `PORT` is not a valid port number
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::InputSchema(format!("invalid PORT '{raw}': {e}")))?,
            None => 8000,
        };

        Ok(Self {
            model_uri: ModelUri::parse(
                &lookup("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            ),
            tracking_dir: lookup("TRACKING_DIR")
                .unwrap_or_else(|| DEFAULT_TRACKING_DIR.to_string())
                .into(),
            experiment_name: lookup("EXPERIMENT_NAME")
                .unwrap_or_else(|| DEFAULT_EXPERIMENT_NAME.to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }

    /// Socket address to bind
    ///
    /// # Errors
    /// Returns error if `host:port` is not a valid socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::InputSchema(format!("invalid HOST '{}': {e}", self.host)))
    }
}

/// Drift report configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DriftConfig {
    /// Reference dataset (`REFERENCE_DATA_PATH`)
    pub reference_path: PathBuf,
    /// Current dataset (`CURRENT_DATA_PATH`)
    pub current_path: PathBuf,
    /// Per-column test (`DRIFT_METHOD`: auto, ks, wasserstein, psi)
    pub method: DriftMethod,
    /// Where to write the JSON report (`DRIFT_REPORT_PATH`); stdout if unset
    pub output_path: Option<PathBuf>,
}

impl DriftConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns error if a dataset path is missing or `DRIFT_METHOD` is unknown
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns error if a dataset path is missing or `DRIFT_METHOD` is unknown
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(PathBuf::from)
                .ok_or_else(|| Error::InputSchema(format!("{key} must be set")))
        };

        Ok(Self {
            reference_path: required("REFERENCE_DATA_PATH")?,
            current_path: required("CURRENT_DATA_PATH")?,
            method: lookup("DRIFT_METHOD")
                .as_deref()
                .map_or(Ok(DriftMethod::Auto), str::parse)?,
            output_path: lookup("DRIFT_REPORT_PATH").map(PathBuf::from),
        })
    }
}
