//! HTTP error mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error returned by request handlers
///
/// Rendered as `{"detail": "<message>"}` with the matching status.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request; the model was never called
    InvalidRequest {
        /// Client error status (400, 415 or 422)
        status: StatusCode,
        /// What was wrong with the request
        detail: String,
    },
    /// The model failed on a well-formed request
    Inference(String),
}

impl ApiError {
    /// Status code this error renders with
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { status, .. } => *status,
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        Self::Inference(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::InvalidRequest { detail, .. } => {
                tracing::debug!(%status, %detail, "rejected request");
                detail
            }
            Self::Inference(detail) => {
                tracing::error!(%detail, "inference failed");
                detail
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
