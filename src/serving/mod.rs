//! Prediction service (axum)
//!
//! ## Routes
//!
//! ```text
//! GET  /         liveness message
//! POST /predict  {"feature_1".."feature_5"} -> {"predicted_rul"}
//! GET  /model    metadata of the loaded artifact
//! ```
//!
//! The model is loaded once by [`PredictionService::load`] and shared
//! read-only through [`AppState`]; handlers take no locks.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{
    ModelInfo, PredictionRequest, PredictionResponse, RootResponse, ROOT_MESSAGE,
};

use crate::config::ServeConfig;
use crate::experiment::{FileTracker, ModelUri, SelectionPolicy};
use crate::model::{ModelArtifact, Regressor};
use crate::{Error, Result};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Features the `/predict` route supplies per row
pub const SERVED_FEATURES: usize = 5;

/// A model artifact together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedModel {
    artifact: ModelArtifact,
    source: ModelUri,
    run_id: Option<String>,
}

impl LoadedModel {
    /// Wrap an artifact loaded from `source`
    #[must_use]
    pub const fn new(artifact: ModelArtifact, source: ModelUri, run_id: Option<String>) -> Self {
        Self {
            artifact,
            source,
            run_id,
        }
    }

    /// The artifact
    #[must_use]
    pub const fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Location it was loaded from
    #[must_use]
    pub const fn source(&self) -> &ModelUri {
        &self.source
    }

    /// Producing run, when loaded from the tracking store
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }
}

/// Shared state of a ready service
#[derive(Debug, Clone)]
pub struct AppState {
    /// Immutable model shared by all requests
    pub model: Arc<LoadedModel>,
}

impl AppState {
    /// State serving `model`
    #[must_use]
    pub fn new(model: LoadedModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

/// Model loading for the service
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionService;

impl PredictionService {
    /// Resolve and load the model named by `config.model_uri`
    ///
    /// # Errors
    /// Returns [`Error::ModelLoad`] if the location cannot be resolved, read
    /// or parsed
    pub fn load(config: &ServeConfig) -> Result<AppState> {
        let location = config.model_uri.to_string();
        let model = match &config.model_uri {
            ModelUri::Path(path) => Self::load_path(path)?,
            ModelUri::Run { run_id, key } => Self::load_from_store(
                config,
                &SelectionPolicy::RunId(run_id.clone()),
                key,
            )
            .map_err(|e| as_model_load(&location, e))?,
            ModelUri::Latest { key } => {
                Self::load_from_store(config, &SelectionPolicy::MostRecent, key)
                    .map_err(|e| as_model_load(&location, e))?
            }
        };

        if model.artifact().n_features() != SERVED_FEATURES {
            tracing::warn!(
                expected = SERVED_FEATURES,
                actual = model.artifact().n_features(),
                "model feature count differs from the request schema; predictions will fail"
            );
        }
        tracing::info!(
            source = %model.source(),
            run_id = model.run_id().unwrap_or("-"),
            "model loaded"
        );
        Ok(AppState::new(model))
    }

    fn load_path(path: &Path) -> Result<LoadedModel> {
        let artifact = ModelArtifact::load(path)?;
        Ok(LoadedModel::new(
            artifact,
            ModelUri::Path(path.to_path_buf()),
            None,
        ))
    }

    fn load_from_store(
        config: &ServeConfig,
        policy: &SelectionPolicy,
        key: &str,
    ) -> Result<LoadedModel> {
        let tracker = FileTracker::open_existing(&config.tracking_dir, &config.experiment_name)?;
        let reference = tracker.resolve_artifact(policy, key)?;
        let bytes = tracker.read_artifact(&reference)?;
        let artifact = ModelArtifact::from_json_slice(&bytes)?;
        Ok(LoadedModel::new(
            artifact,
            reference.uri(),
            Some(reference.run_id),
        ))
    }
}

fn as_model_load(location: &str, err: Error) -> Error {
    match err {
        Error::ModelLoad { .. } => err,
        other => Error::model_load(location, other),
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/predict", post(handlers::predict))
        .route("/model", get(handlers::model_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the model and serve until the process is stopped
///
/// # Errors
/// Returns error if the model cannot be loaded or the address cannot be bound
pub async fn serve(config: ServeConfig) -> Result<()> {
    let state = PredictionService::load(&config)?;
    let addr = config.socket_addr()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "prediction service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
