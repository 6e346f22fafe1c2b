use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// At most one per meeting; replaced atomically (with its segments) on
/// re-transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub meeting_id: i64,
    pub full_text: String,
    pub formatted: String,
    pub stats: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
