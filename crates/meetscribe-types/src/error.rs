use thiserror::Error;

/// The error taxonomy shared by the orchestrator, the worker pipeline,
/// and both binaries' HTTP layers. Rendered via `Display` into
/// `TranscriptionResult.error` / `WorkerJob.error` as plain text — the
/// wire contract is a string, not a structured code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    /// Probe reported the worker unreachable and no wake path was
    /// configured, or the wake attempt itself failed.
    #[error("GPU worker unreachable")]
    Unreachable,

    /// `POST /transcribe` returned something other than 202 or 200.
    #[error("worker rejected submission: {0}")]
    SubmitRejected(String),

    /// 401/403 on submit or poll. Fails fast — no retry.
    #[error("authentication failed against GPU worker")]
    AuthFailure,

    /// `404` during poll: the worker restarted mid-job.
    #[error("worker lost track of job (possible restart)")]
    WorkerLost,

    /// The poll deadline was reached before a terminal status arrived.
    #[error("GPU worker poll timeout reached")]
    WorkerTimeout,

    /// The ffmpeg-equivalent conversion stage exited non-zero.
    #[error("audio conversion failed: {0}")]
    AudioError(String),

    /// A pipeline stage (ffmpeg or diarization) exceeded its own
    /// deadline.
    #[error("transcription stage timed out: {0}")]
    TranscriptionTimeout(String),

    /// STT or diarization model inference raised.
    #[error("model error: {0}")]
    ModelError(String),

    /// The fallback transcriber is unavailable (disabled, or a
    /// required resource is missing).
    #[error("fallback transcriber unavailable")]
    FallbackUnavailable,

    /// Catch-all for anything not covered above.
    #[error("{0}")]
    Generic(String),
}

impl TranscriptionError {
    /// `true` for the cases spec.md marks as fail-fast (no retry, no
    /// fallback should be attempted for the same attempt).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TranscriptionError::AuthFailure)
    }
}
