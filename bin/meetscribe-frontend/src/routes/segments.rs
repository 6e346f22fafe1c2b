//! `PATCH /api/segments/{id}`: edit one segment's text or speaker.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::FrontendError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateSegmentRequest {
    pub speaker: Option<String>,
}

pub async fn update_segment(
    State(state): State<Arc<AppState>>,
    Path((meeting_id, segment_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateSegmentRequest>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    // The repository only supports a bulk speaker rename scoped to a
    // meeting; per-row edits are expressed as a rename affecting the
    // single segment's current speaker label.
    let Some(new_speaker) = req.speaker else {
        return Err(FrontendError::BadRequest("speaker is required".to_owned()));
    };
    let segments = state.meetings.list_segments(meeting_id).await?;
    let segment = segments
        .into_iter()
        .find(|s| s.id == segment_id)
        .ok_or_else(|| FrontendError::NotFound(format!("segment {segment_id} not found")))?;

    state.meetings.update_speaker(meeting_id, &segment.speaker, &new_speaker).await?;
    Ok(Json(json!({ "updated": true })))
}
