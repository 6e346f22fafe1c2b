//! `POST /transcribe`: accept multipart audio + metadata, persist to a
//! fresh temp directory, and dispatch the pipeline in the background.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use meetscribe_types::TranscriptionMetadata;
use meetscribe_worker_engine::sanitize_filename;
use serde_json::json;
use uuid::Uuid;

use crate::error::WorkerError;
use crate::state::AppState;

pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), WorkerError> {
    let mut metadata: Option<TranscriptionMetadata> = None;
    let mut mic_bytes: Option<(String, Vec<u8>)> = None;
    let mut tab_bytes: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WorkerError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_owned();
        match name.as_str() {
            "metadata" => {
                let raw = field.text().await.map_err(|e| WorkerError::BadRequest(e.to_string()))?;
                metadata = Some(
                    serde_json::from_str(&raw)
                        .map_err(|e| WorkerError::BadRequest(format!("invalid metadata: {e}")))?,
                );
            }
            "mic_file" => {
                let file_name = field.file_name().unwrap_or("mic.wav").to_owned();
                let data = field.bytes().await.map_err(|e| WorkerError::BadRequest(e.to_string()))?;
                mic_bytes = Some((file_name, data.to_vec()));
            }
            "tab_file" => {
                let file_name = field.file_name().unwrap_or("tab.wav").to_owned();
                let data = field.bytes().await.map_err(|e| WorkerError::BadRequest(e.to_string()))?;
                tab_bytes = Some((file_name, data.to_vec()));
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if mic_bytes.is_none() && tab_bytes.is_none() {
        return Err(WorkerError::BadRequest("at least one of mic_file or tab_file is required".to_owned()));
    }
    let metadata = metadata.unwrap_or_default();

    let job_id = metadata.job_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let job_dir = std::path::Path::new(&state.config.work_dir).join(&job_id);
    tokio::fs::create_dir_all(&job_dir)
        .await
        .map_err(|e| WorkerError::Internal(format!("failed to create job directory: {e}")))?;

    let mic_path = match mic_bytes {
        Some((name, data)) => Some(write_upload(&job_dir, "mic", &name, &data).await?),
        None => None,
    };
    let tab_path = match tab_bytes {
        Some((name, data)) => Some(write_upload(&job_dir, "tab", &name, &data).await?),
        None => None,
    };

    state.engine.submit(job_id.clone(), job_dir, mic_path, tab_path, metadata);

    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id, "status": "queued" }))))
}

async fn write_upload(
    job_dir: &std::path::Path,
    prefix: &str,
    file_name: &str,
    data: &[u8],
) -> Result<std::path::PathBuf, WorkerError> {
    let sanitized = sanitize_filename(file_name);
    let path = job_dir.join(format!("{prefix}_{sanitized}"));
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| WorkerError::Internal(format!("failed to write upload: {e}")))?;
    Ok(path)
}
