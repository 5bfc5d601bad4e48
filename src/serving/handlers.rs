//! Route handlers

use super::error::ApiError;
use super::AppState;
use crate::model::Regressor;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Liveness message returned by `GET /`
pub const ROOT_MESSAGE: &str = "Predictive Maintenance Model API is running";

/// `GET /` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    /// Liveness message
    pub message: String,
}

/// `POST /predict` body: five required numeric sensor features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Feature 1
    pub feature_1: f64,
    /// Feature 2
    pub feature_2: f64,
    /// Feature 3
    pub feature_3: f64,
    /// Feature 4
    pub feature_4: f64,
    /// Feature 5
    pub feature_5: f64,
}

impl PredictionRequest {
    /// Model input row in feature order
    #[must_use]
    pub const fn to_row(&self) -> [f64; 5] {
        [
            self.feature_1,
            self.feature_2,
            self.feature_3,
            self.feature_4,
            self.feature_5,
        ]
    }
}

/// `POST /predict` response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted remaining useful life
    pub predicted_rul: f64,
}

/// `GET /model` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Where the model was loaded from
    pub source: String,
    /// Tracking run that produced the model, if loaded from the store
    pub run_id: Option<String>,
    /// Feature names in training order
    pub feature_names: Vec<String>,
    /// Target column
    pub target: String,
    /// Trees in the forest
    pub n_estimators: usize,
}

/// `GET /`
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let predicted_rul = state.model.artifact().predict_row(&request.to_row())?;

    tracing::debug!(predicted_rul, "prediction served");
    Ok(Json(PredictionResponse { predicted_rul }))
}

/// `GET /model`
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let artifact = state.model.artifact();
    Json(ModelInfo {
        source: state.model.source().to_string(),
        run_id: state.model.run_id().map(str::to_string),
        feature_names: artifact.feature_names().to_vec(),
        target: artifact.target().to_string(),
        n_estimators: artifact.model().trees().len(),
    })
}
