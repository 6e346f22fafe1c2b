//! In-memory worker job store. Not persisted: a worker restart drops
//! every record, which is exactly why the frontend treats a poll `404`
//! as "possible restart" rather than something to retry past.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use meetscribe_types::{TranscriptionResult, WorkerJob, WorkerJobStatus};

const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct WorkerJobStore {
    jobs: Mutex<HashMap<String, WorkerJob>>,
    history_limit: usize,
}

impl Default for WorkerJobStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl WorkerJobStore {
    pub fn new(history_limit: usize) -> Self {
        Self { jobs: Mutex::new(HashMap::new()), history_limit }
    }

    pub fn insert_queued(&self, job_id: String) {
        let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        jobs.insert(job_id.clone(), WorkerJob::queued(job_id));
    }

    pub fn set_processing(&self, job_id: &str) {
        let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = WorkerJobStatus::Processing;
            job.started_at = Some(Utc::now());
        }
    }

    pub fn set_progress(&self, job_id: &str, step: &str, detail: Option<&str>) {
        let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        if let Some(job) = jobs.get_mut(job_id) {
            job.progress_step = Some(step.to_owned());
            job.progress_detail = detail.map(str::to_owned);
        }
    }

    pub fn set_completed(&self, job_id: &str, result: TranscriptionResult) {
        {
            let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
            if let Some(job) = jobs.get_mut(job_id) {
                job.status = WorkerJobStatus::Completed;
                job.completed_at = Some(Utc::now());
                job.result = Some(result);
            }
        }
        self.evict_if_over_capacity();
    }

    pub fn set_failed(&self, job_id: &str, error: String) {
        {
            let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
            if let Some(job) = jobs.get_mut(job_id) {
                job.status = WorkerJobStatus::Failed;
                job.completed_at = Some(Utc::now());
                job.error = Some(error);
            }
        }
        self.evict_if_over_capacity();
    }

    pub fn get(&self, job_id: &str) -> Option<WorkerJob> {
        let jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        jobs.get(job_id).cloned()
    }

    /// The job currently in `processing`, if any. At most one exists at
    /// a time, enforced by the GPU slot mutex upstream.
    pub fn current_processing(&self) -> Option<String> {
        let jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        jobs.values()
            .find(|j| j.status == WorkerJobStatus::Processing)
            .map(|j| j.job_id.clone())
    }

    /// Evicts the oldest terminal record (by `completed_at`) until at
    /// most `history_limit` terminal records remain. Non-terminal jobs
    /// are never touched.
    fn evict_if_over_capacity(&self) {
        let mut jobs = self.jobs.lock().expect("worker job store mutex poisoned");
        loop {
            let terminal_count = jobs.values().filter(|j| j.status.is_terminal()).count();
            if terminal_count <= self.history_limit {
                break;
            }
            let oldest = jobs
                .iter()
                .filter(|(_, j)| j.status.is_terminal())
                .min_by_key(|(_, j)| j.completed_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    jobs.remove(&id);
                }
                None => break,
            }
        }
    }
}
