//! Unified worker error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WorkerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            WorkerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            WorkerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            WorkerError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for WorkerError {
    fn from(e: anyhow::Error) -> Self {
        WorkerError::Internal(e.to_string())
    }
}
