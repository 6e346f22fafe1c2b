use serde::{Deserialize, Serialize};

/// The `metadata` JSON string carried alongside the multipart upload on
/// `POST /transcribe`. Every field is optional; the worker falls back
/// to its own configured defaults for anything absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionMetadata {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub local_speaker: Option<String>,
    #[serde(default)]
    pub remote_speaker: Option<String>,
    #[serde(default)]
    pub mic_start_offset: Option<f64>,
    #[serde(default)]
    pub tab_start_offset: Option<f64>,
}
