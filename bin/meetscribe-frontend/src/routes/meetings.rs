//! Meeting CRUD: rename, rename speakers across all segments, delete,
//! and serve the underlying audio file.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::error::FrontendError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateMeetingRequest {
    pub title: Option<String>,
}

pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    Json(req): Json<UpdateMeetingRequest>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(FrontendError::BadRequest("title must not be empty".to_owned()));
        }
        state.meetings.update_title(meeting_id, title).await?;
    }
    let meeting = state
        .meetings
        .get_meeting(meeting_id)
        .await?
        .ok_or_else(|| FrontendError::NotFound(format!("meeting {meeting_id} not found")))?;
    Ok(Json(json!(meeting)))
}

#[derive(Debug, Deserialize)]
pub struct RenameSpeakerRequest {
    pub old_name: String,
    pub new_name: String,
}

pub async fn rename_speaker(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    Json(req): Json<RenameSpeakerRequest>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    if req.new_name.trim().is_empty() {
        return Err(FrontendError::BadRequest("new_name must not be empty".to_owned()));
    }
    let changed = state.meetings.update_speaker(meeting_id, &req.old_name, &req.new_name).await?;
    Ok(Json(json!({ "changed": changed })))
}

pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    state.meetings.delete_meeting(meeting_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
) -> Result<Response, FrontendError> {
    let meeting = state
        .meetings
        .get_meeting(meeting_id)
        .await?
        .ok_or_else(|| FrontendError::NotFound(format!("meeting {meeting_id} not found")))?;
    let audio_file = meeting
        .audio_file
        .ok_or_else(|| FrontendError::NotFound(format!("meeting {meeting_id} has no audio file")))?;

    let file = tokio::fs::File::open(&audio_file)
        .await
        .map_err(|_| FrontendError::NotFound(format!("audio file for meeting {meeting_id} is missing on disk")))?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        [(header::CONTENT_TYPE, "audio/wav")],
        body,
    )
        .into_response())
}
