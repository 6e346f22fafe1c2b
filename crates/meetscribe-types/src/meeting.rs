use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Meeting`]. `Processing` is the only
/// non-terminal value; a meeting's status mirrors the terminal state of
/// its [`crate::FrontendJob`] once one completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Processing => "processing",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(MeetingStatus::Processing),
            "completed" => Some(MeetingStatus::Completed),
            "failed" => Some(MeetingStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MeetingStatus::Processing)
    }
}

/// A recorded meeting: the upload-time metadata plus whatever the
/// transcription pipeline later fills in (`status`, `extracted_data`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub status: MeetingStatus,
    pub audio_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque JSON blob produced by post-extraction (summary/actions).
    /// `None` until a `PostExtractor` runs successfully.
    pub extracted_data: Option<serde_json::Value>,
}
