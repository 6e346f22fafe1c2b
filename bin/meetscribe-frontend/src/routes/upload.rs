//! `POST /api/upload`: accept mic/tab audio plus meeting metadata,
//! persist them, create the meeting and frontend job, and dispatch
//! transcription in the background. Returns before transcription
//! completes.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use meetscribe_types::{FrontendJobStatus, MeetingStatus, TranscriptionMetadata};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::FrontendError;
use crate::state::AppState;

struct UploadedFields {
    title: Option<String>,
    date: Option<DateTime<Utc>>,
    duration: Option<f64>,
    platform: Option<String>,
    url: Option<String>,
    local_speaker: Option<String>,
    remote_speaker: Option<String>,
    mic_start_offset: Option<f64>,
    tab_start_offset: Option<f64>,
    mic_bytes: Option<(String, Vec<u8>)>,
    tab_bytes: Option<(String, Vec<u8>)>,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, FrontendError> {
    let mut fields = UploadedFields {
        title: None,
        date: None,
        duration: None,
        platform: None,
        url: None,
        local_speaker: None,
        remote_speaker: None,
        mic_start_offset: None,
        tab_start_offset: None,
        mic_bytes: None,
        tab_bytes: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FrontendError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_owned();
        match name.as_str() {
            "mic_file" => {
                let file_name = field.file_name().unwrap_or("mic.wav").to_owned();
                let data = field.bytes().await.map_err(|e| FrontendError::BadRequest(e.to_string()))?;
                fields.mic_bytes = Some((file_name, data.to_vec()));
            }
            "tab_file" => {
                let file_name = field.file_name().unwrap_or("tab.wav").to_owned();
                let data = field.bytes().await.map_err(|e| FrontendError::BadRequest(e.to_string()))?;
                fields.tab_bytes = Some((file_name, data.to_vec()));
            }
            "title" => fields.title = Some(text_field(field).await?),
            "date" => {
                let raw = text_field(field).await?;
                fields.date = DateTime::parse_from_rfc3339(&raw).ok().map(|d| d.with_timezone(&Utc));
            }
            "duration" => fields.duration = text_field(field).await?.parse().ok(),
            "platform" => fields.platform = Some(text_field(field).await?),
            "url" => fields.url = Some(text_field(field).await?),
            "local_speaker" => fields.local_speaker = Some(text_field(field).await?),
            "remote_speaker" => fields.remote_speaker = Some(text_field(field).await?),
            "mic_start_offset" => fields.mic_start_offset = text_field(field).await?.parse().ok(),
            "tab_start_offset" => fields.tab_start_offset = text_field(field).await?.parse().ok(),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if fields.mic_bytes.is_none() && fields.tab_bytes.is_none() {
        return Err(FrontendError::BadRequest("at least one of mic_file or tab_file is required".to_owned()));
    }

    let title = fields.title.clone().unwrap_or_else(|| "untitled meeting".to_owned());
    let meeting_id = state
        .meetings
        .create_meeting(&title, fields.date, fields.duration, fields.platform.as_deref(), fields.url.as_deref())
        .await?;

    let job_id = Uuid::new_v4().to_string();
    let job_dir = std::path::Path::new(&state.config.upload_dir).join(&job_id);
    tokio::fs::create_dir_all(&job_dir)
        .await
        .map_err(|e| FrontendError::Internal(format!("failed to create upload directory: {e}")))?;

    let mic_path = match &fields.mic_bytes {
        Some((name, data)) => Some(write_upload(&job_dir, "mic", name, data).await?),
        None => None,
    };
    let tab_path = match &fields.tab_bytes {
        Some((name, data)) => Some(write_upload(&job_dir, "tab", name, data).await?),
        None => None,
    };

    if let Some(path) = &mic_path {
        state.meetings.set_audio_file(meeting_id, &path.to_string_lossy()).await?;
    } else if let Some(path) = &tab_path {
        state.meetings.set_audio_file(meeting_id, &path.to_string_lossy()).await?;
    }

    state.jobs.create_job(&job_id, meeting_id).await?;

    let metadata = TranscriptionMetadata {
        job_id: Some(job_id.clone()),
        request_id: None,
        title: Some(title),
        date: fields.date.map(|d| d.to_rfc3339()),
        duration: fields.duration,
        platform: fields.platform,
        url: fields.url,
        local_speaker: fields.local_speaker,
        remote_speaker: fields.remote_speaker,
        mic_start_offset: fields.mic_start_offset,
        tab_start_offset: fields.tab_start_offset,
    };

    let state_for_task = state.clone();
    let job_id_for_task = job_id.clone();
    tokio::spawn(async move {
        state_for_task.jobs.update_status(&job_id_for_task, FrontendJobStatus::Processing, None, None).await.ok();

        let result = state_for_task
            .orchestrator
            .transcribe(mic_path.as_deref(), tab_path.as_deref(), &metadata, &job_id_for_task, None)
            .await;

        if result.success {
            info!(job_id = %job_id_for_task, meeting_id, "transcription completed");
            let segments: Vec<(String, String, f64, f64)> = result
                .segments
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|s| (s.speaker, s.text, s.start, s.end))
                .collect();
            let stats_json = serde_json::to_value(&result.stats).unwrap_or(serde_json::Value::Null);
            let formatted = result.formatted.clone().unwrap_or_default();
            let full_text = segments.iter().map(|s| s.1.clone()).collect::<Vec<_>>().join(" ");

            if let Err(err) = state_for_task.meetings.save_transcript(meeting_id, &full_text, &formatted, &stats_json, &segments).await {
                error!(job_id = %job_id_for_task, %err, "failed to persist transcript");
            }
            state_for_task.meetings.update_status(meeting_id, MeetingStatus::Completed).await.ok();
            let result_json = serde_json::to_value(&result).unwrap_or(json!({}));
            state_for_task
                .jobs
                .update_status(&job_id_for_task, FrontendJobStatus::Completed, Some(result_json), None)
                .await
                .ok();
        } else {
            let error_message = result.error.clone().unwrap_or_else(|| "transcription failed".to_owned());
            warn!(job_id = %job_id_for_task, meeting_id, error = %error_message, "transcription failed");
            state_for_task.meetings.update_status(meeting_id, MeetingStatus::Failed).await.ok();
            state_for_task
                .jobs
                .update_status(&job_id_for_task, FrontendJobStatus::Failed, None, Some(&error_message))
                .await
                .ok();
        }
    });

    Ok(Json(json!({ "job_id": job_id, "meeting_id": meeting_id, "status": "queued" })))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, FrontendError> {
    field.text().await.map_err(|e| FrontendError::BadRequest(e.to_string()))
}

async fn write_upload(
    job_dir: &std::path::Path,
    prefix: &str,
    file_name: &str,
    data: &[u8],
) -> Result<std::path::PathBuf, FrontendError> {
    let sanitized = sanitize_filename(file_name);
    let path = job_dir.join(format!("{prefix}_{sanitized}"));
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| FrontendError::Internal(format!("failed to write upload: {e}")))?;
    Ok(path)
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    let cleaned = cleaned.replace("..", "");
    if cleaned.is_empty() {
        "upload".to_owned()
    } else {
        cleaned
    }
}
