//! `GET /jobs/{id}`: job status/result query protocol.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::WorkerError;
use crate::state::AppState;

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, WorkerError> {
    let job = state
        .engine
        .get(&job_id)
        .ok_or_else(|| WorkerError::NotFound(format!("job {job_id} not found")))?;

    let elapsed_seconds = job.started_at.map(|start| {
        let end = job.completed_at.unwrap_or_else(chrono::Utc::now);
        (end - start).num_milliseconds() as f64 / 1000.0
    });

    Ok(Json(json!({
        "job_id": job.job_id,
        "status": job.status.as_str(),
        "progress_step": job.progress_step,
        "progress_detail": job.progress_detail,
        "elapsed_seconds": elapsed_seconds,
        "result": job.result,
        "error": job.error,
    })))
}
