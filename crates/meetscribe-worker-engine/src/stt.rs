//! Speech-to-text is out of scope for this crate's own logic (spec.md
//! §1): it is expressed as a trait so a real model (`whisper-rs`,
//! `candle`, or an HTTP call to a model server) is a drop-in
//! implementation. [`PlaceholderRecognizer`] is a deterministic
//! reference implementation so the rest of the pipeline is testable
//! without a real model.

use std::path::Path;

use meetscribe_types::TranscriptionError;

/// One STT-recognized span, before diarization relabels it.
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, pcm_path: &Path) -> Result<Vec<RawSegment>, TranscriptionError>;
}

/// Treats the whole file as one utterance, with a duration derived
/// from its byte length under the assumption of 16kHz mono
/// `pcm_s16le` (2 bytes/sample) — matching the conversion stage's
/// fixed output format.
pub struct PlaceholderRecognizer;

const SAMPLE_RATE_HZ: f64 = 16_000.0;
const BYTES_PER_SAMPLE: f64 = 2.0;

#[async_trait::async_trait]
impl SpeechRecognizer for PlaceholderRecognizer {
    async fn transcribe(&self, pcm_path: &Path) -> Result<Vec<RawSegment>, TranscriptionError> {
        let metadata = tokio::fs::metadata(pcm_path)
            .await
            .map_err(|e| TranscriptionError::ModelError(e.to_string()))?;
        let duration = metadata.len() as f64 / (SAMPLE_RATE_HZ * BYTES_PER_SAMPLE);

        if duration <= 0.0 {
            return Ok(Vec::new());
        }

        Ok(vec![RawSegment {
            start: 0.0,
            end: duration,
            text: "[transcribed audio]".to_owned(),
        }])
    }
}
