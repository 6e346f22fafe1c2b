//! Single-GPU-holder job serializer. Accepts submissions and spawns a
//! background task per job that acquires the GPU slot (waiting, never
//! rejecting), runs the pipeline, and records the terminal outcome.

use std::path::PathBuf;
use std::sync::Arc;

use meetscribe_types::{TranscriptionMetadata, WorkerJob};
use tokio::sync::Mutex;
use tracing::info;

use crate::pipeline::{ProgressCallback, WorkerPipeline};
use crate::store::WorkerJobStore;

pub struct WorkerJobEngine {
    gpu_slot: Arc<Mutex<()>>,
    store: Arc<WorkerJobStore>,
    pipeline: Arc<WorkerPipeline>,
}

impl WorkerJobEngine {
    pub fn new(pipeline: WorkerPipeline, store: Arc<WorkerJobStore>) -> Self {
        Self {
            gpu_slot: Arc::new(Mutex::new(())),
            store,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Records the job as queued and spawns its pipeline task. Returns
    /// immediately — callers respond `202` right after this call, not
    /// after the pipeline finishes.
    pub fn submit(
        &self,
        job_id: String,
        job_dir: PathBuf,
        mic_path: Option<PathBuf>,
        tab_path: Option<PathBuf>,
        metadata: TranscriptionMetadata,
    ) {
        self.store.insert_queued(job_id.clone());

        let gpu_slot = self.gpu_slot.clone();
        let store = self.store.clone();
        let pipeline = self.pipeline.clone();

        tokio::spawn(async move {
            let _permit = gpu_slot.lock().await;
            store.set_processing(&job_id);
            info!(job_id = %job_id, "acquired GPU slot, starting pipeline");

            let progress: ProgressCallback = {
                let store = store.clone();
                let job_id = job_id.clone();
                Arc::new(move |step: &str, detail: Option<&str>| {
                    store.set_progress(&job_id, step, detail);
                    info!(job_id = %job_id, step, detail = detail.unwrap_or(""), "pipeline progress");
                })
            };

            let outcome = pipeline.run(&job_dir, mic_path, tab_path, &metadata, progress).await;
            match outcome {
                Ok(result) => store.set_completed(&job_id, result),
                Err(err) => store.set_failed(&job_id, err.to_string()),
            }

            if let Err(err) = tokio::fs::remove_dir_all(&job_dir).await {
                tracing::warn!(job_id = %job_id, %err, "failed to clean up job temp directory");
            }
        });
    }

    pub fn get(&self, job_id: &str) -> Option<WorkerJob> {
        self.store.get(job_id)
    }

    /// `true` while a pipeline task holds the GPU slot.
    pub fn is_locked(&self) -> bool {
        self.gpu_slot.try_lock().is_err()
    }

    pub fn current_job(&self) -> Option<String> {
        self.store.current_processing()
    }
}

/// Strips path separators, null bytes, `..` and non-word characters
/// from an uploaded filename before it touches the filesystem.
pub fn sanitize_filename(name: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_traversal_and_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("a/b\\c"), "abc");
    }

    #[test]
    fn sanitize_strips_null_bytes_and_non_word_chars() {
        assert_eq!(sanitize_filename("mic\0file!.wav"), "micfile.wav");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_survives() {
        assert_eq!(sanitize_filename("***"), "upload");
    }
}
