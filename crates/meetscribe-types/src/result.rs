use serde::{Deserialize, Serialize};

/// One segment as it appears in a [`TranscriptionResult`] payload —
/// distinct from [`crate::Segment`], which is the persisted row shape
/// (it carries an `id`/`meeting_id` the wire payload doesn't have yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSegment {
    pub speaker: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub total_segments: usize,
    pub mic_segments: usize,
    pub tab_segments: usize,
    pub device: String,
    pub model: String,
}

/// The authoritative outcome of one transcription attempt, whether it
/// came back from the remote worker, a legacy synchronous worker, or an
/// in-process fallback. Callers distinguish success/failure solely by
/// `success`; a `false` result always carries `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<ResultSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub used_fallback: bool,
}

impl TranscriptionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            segments: None,
            formatted: None,
            stats: None,
            error: Some(error.into()),
            used_fallback: false,
        }
    }

    pub fn with_fallback(mut self, used_fallback: bool) -> Self {
        self.used_fallback = used_fallback;
        self
    }
}
