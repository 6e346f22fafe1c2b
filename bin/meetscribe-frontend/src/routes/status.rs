//! `GET /api/status/{job_id}`: the current lifecycle state of a
//! dispatched job.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::FrontendError;
use crate::state::AppState;

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, FrontendError> {
    let job = state
        .jobs
        .get_job(&job_id)
        .await?
        .ok_or_else(|| FrontendError::NotFound(format!("job {job_id} not found")))?;

    Ok(Json(json!({
        "job_id": job.job_id,
        "meeting_id": job.meeting_id,
        "status": job.status.as_str(),
        "created_at": job.created_at,
        "updated_at": job.updated_at,
        "result": job.result,
        "error": job.error,
    })))
}
