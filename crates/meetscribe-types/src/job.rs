use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a frontend-persisted job. Terminal iff
/// `completed` or `failed`, matching the owning `Meeting`'s status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendJobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl FrontendJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrontendJobStatus::Queued => "queued",
            FrontendJobStatus::Processing => "processing",
            FrontendJobStatus::Completed => "completed",
            FrontendJobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(FrontendJobStatus::Queued),
            "processing" => Some(FrontendJobStatus::Processing),
            "completed" => Some(FrontendJobStatus::Completed),
            "failed" => Some(FrontendJobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FrontendJobStatus::Completed | FrontendJobStatus::Failed)
    }
}

/// Persisted frontend-side job record: the durable half of the
/// dispatch pipeline, surviving frontend restarts. Foreign-keyed to a
/// `Meeting`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendJob {
    pub job_id: String,
    pub meeting_id: i64,
    pub status: FrontendJobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}
