use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{FrameError, SplitFrame};
use super::AppState;
use crate::{PipelineError, PipelineInfo};

pub const HEALTH_MESSAGE: &str = "Service is running";
pub const PREDICT_USAGE_MESSAGE: &str = "Please POST data to this endpoint to return predictions";

/// Request-level failures. None of them affect the serving process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    SchemaMismatch(String),
    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SchemaMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FrameError> for ServerError {
    fn from(err: FrameError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::SchemaMismatchError { .. } => Self::SchemaMismatch(err.to_string()),
            PipelineError::ValidationError(_) => Self::BadRequest(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<String>,
}

pub async fn health_handler() -> &'static str {
    HEALTH_MESSAGE
}

pub async fn predict_usage_handler() -> &'static str {
    PREDICT_USAGE_MESSAGE
}

/// Accepts a split-orient JSON table regardless of the declared content type.
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ServerError> {
    let frame: SplitFrame = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid split-orient JSON table: {}", e)))?;
    let records = frame.into_records()?;

    let pipeline = state.model.current().await;
    let predictions = tokio::task::spawn_blocking(move || pipeline.predict(&records))
        .await
        .map_err(|e| ServerError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(Json(PredictResponse { predictions }))
}

pub async fn info_handler(State(state): State<Arc<AppState>>) -> Json<PipelineInfo> {
    Json(state.model.current().await.info())
}

pub async fn reload_handler(State(state): State<Arc<AppState>>) -> Result<Json<PipelineInfo>, ServerError> {
    state
        .model
        .reload()
        .await
        .map(Json)
        .map_err(|e| ServerError::Internal(format!("Reload failed, keeping current pipeline: {}", e)))
}
