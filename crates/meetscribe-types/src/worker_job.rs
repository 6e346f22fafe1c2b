use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::TranscriptionResult;

/// Lifecycle state of an in-memory worker job. `queued -> processing ->
/// {completed, failed}`; no transitions out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerJobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl WorkerJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerJobStatus::Queued => "queued",
            WorkerJobStatus::Processing => "processing",
            WorkerJobStatus::Completed => "completed",
            WorkerJobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerJobStatus::Completed | WorkerJobStatus::Failed)
    }
}

/// In-memory record tracked by the worker's `WorkerJobEngine`. Not
/// persisted: a worker restart drops every in-flight job, which is why
/// the frontend treats a `404` on poll as "possible restart" rather than
/// retrying indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerJob {
    pub job_id: String,
    pub status: WorkerJobStatus,
    pub progress_step: Option<String>,
    pub progress_detail: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<TranscriptionResult>,
    pub error: Option<String>,
}

impl WorkerJob {
    pub fn queued(job_id: String) -> Self {
        Self {
            job_id,
            status: WorkerJobStatus::Queued,
            progress_step: None,
            progress_detail: None,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}
