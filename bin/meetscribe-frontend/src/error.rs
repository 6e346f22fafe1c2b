//! Unified frontend error type.
//!
//! Every handler returns `Result<T, FrontendError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meetscribe_types::TranscriptionError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    /// Propagated from the job/meeting store.
    #[error("database error: {0}")]
    Database(#[from] meetscribe_db::DbError),

    /// Propagated from the dispatch orchestrator.
    #[error("transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller's credentials were missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            FrontendError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            FrontendError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            FrontendError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            FrontendError::Transcription(e) if e.is_auth_failure() => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            FrontendError::Transcription(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            FrontendError::Database(meetscribe_db::DbError::MeetingNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("meeting {id} not found"))
            }
            FrontendError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            FrontendError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for FrontendError {
    fn from(e: anyhow::Error) -> Self {
        FrontendError::Internal(e.to_string())
    }
}
