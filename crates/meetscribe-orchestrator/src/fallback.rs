use std::path::Path;

use meetscribe_types::{TranscriptionMetadata, TranscriptionResult};

/// In-process CPU pipeline invoked when the remote GPU path is
/// unusable. A real implementation runs the same stage sequence as the
/// worker's `WorkerPipeline`, but on a smaller local model.
#[async_trait::async_trait]
pub trait FallbackTranscriber: Send + Sync {
    async fn transcribe(
        &self,
        mic_path: Option<&Path>,
        tab_path: Option<&Path>,
        metadata: &TranscriptionMetadata,
    ) -> TranscriptionResult;
}

/// Used when `fallback.enabled = false`: every call reports
/// [`meetscribe_types::TranscriptionError::FallbackUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledFallback;

#[async_trait::async_trait]
impl FallbackTranscriber for DisabledFallback {
    async fn transcribe(
        &self,
        _mic_path: Option<&Path>,
        _tab_path: Option<&Path>,
        _metadata: &TranscriptionMetadata,
    ) -> TranscriptionResult {
        TranscriptionResult::failure(
            meetscribe_types::TranscriptionError::FallbackUnavailable.to_string(),
        )
    }
}
