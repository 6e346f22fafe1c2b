//! `GET /api/transcripts` and `GET /api/transcripts/{id}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::FrontendError;
use crate::state::AppState;

/// Lists every meeting, newest first, without their transcript bodies —
/// callers fetch `GET /api/transcripts/{id}` for the full text.
pub async fn list_transcripts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    let meetings = state.meetings.list_meetings().await?;
    Ok(Json(json!({ "meetings": meetings })))
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    let transcript = state
        .meetings
        .get_transcript(meeting_id)
        .await?
        .ok_or_else(|| FrontendError::NotFound(format!("transcript for meeting {meeting_id} not found")))?;
    let segments = state.meetings.list_segments(meeting_id).await?;

    Ok(Json(json!({
        "meeting_id": transcript.meeting_id,
        "full_text": transcript.full_text,
        "formatted": transcript.formatted,
        "stats": transcript.stats,
        "created_at": transcript.created_at,
        "segments": segments,
    })))
}
