//! Composes probe -> wake -> submit/poll -> fallback into the
//! authoritative [`TranscriptionResult`] for one job.

use std::path::Path;
use std::sync::Arc;

use meetscribe_gpu_client::{GpuHealthProbe, GpuSubmitPoller, GpuWaker, SubmitOutcome};
use meetscribe_types::{TranscriptionError, TranscriptionMetadata, TranscriptionResult};
use tracing::{info, warn};

use crate::fallback::FallbackTranscriber;

pub struct TranscriptionOrchestrator {
    probe: GpuHealthProbe,
    waker: Option<GpuWaker>,
    poller: GpuSubmitPoller,
    fallback: Option<Arc<dyn FallbackTranscriber>>,
}

impl TranscriptionOrchestrator {
    pub fn new(
        probe: GpuHealthProbe,
        waker: Option<GpuWaker>,
        poller: GpuSubmitPoller,
        fallback: Option<Arc<dyn FallbackTranscriber>>,
    ) -> Self {
        Self { probe, waker, poller, fallback }
    }

    /// At least one of `mic_path`, `tab_path` must be present; both
    /// `None` is a caller bug, not something this method validates (the
    /// upload layer is responsible for that).
    pub async fn transcribe(
        &self,
        mic_path: Option<&Path>,
        tab_path: Option<&Path>,
        metadata: &TranscriptionMetadata,
        job_id: &str,
        request_id: Option<&str>,
    ) -> TranscriptionResult {
        let mut gpu_available = self.probe.is_available().await;

        if !gpu_available {
            if let Some(waker) = &self.waker {
                gpu_available = waker.try_wake(job_id).await;
            }
        }

        if gpu_available {
            info!(job_id, "using GPU worker");
            match self.try_gpu(mic_path, tab_path, metadata, request_id).await {
                Some(result) if result.success => return result,
                Some(result) => {
                    warn!(job_id, error = result.error.as_deref().unwrap_or(""), "GPU path failed");
                }
                None => {}
            }
        } else {
            info!(job_id, "GPU unavailable, using CPU fallback");
        }

        if let Some(fallback) = &self.fallback {
            let result = fallback.transcribe(mic_path, tab_path, metadata).await;
            return result.with_fallback(true);
        }

        warn!(job_id, "GPU unavailable and fallback disabled");
        TranscriptionResult::failure(
            if gpu_available {
                TranscriptionError::FallbackUnavailable.to_string()
            } else {
                "GPU unavailable and fallback disabled".to_owned()
            },
        )
    }

    async fn try_gpu(
        &self,
        mic_path: Option<&Path>,
        tab_path: Option<&Path>,
        metadata: &TranscriptionMetadata,
        request_id: Option<&str>,
    ) -> Option<TranscriptionResult> {
        match self.poller.submit(mic_path, tab_path, metadata, request_id).await {
            Ok(SubmitOutcome::Accepted { worker_job_id }) => {
                Some(self.poller.poll(&worker_job_id, request_id).await)
            }
            Ok(SubmitOutcome::Legacy(result)) => Some(result),
            Err(err) => Some(TranscriptionResult::failure(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetscribe_gpu_client::SubmitPollerConfig;
    use meetscribe_smart_plug::SmartPlugActuator;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host_port(server: &MockServer) -> (String, u16) {
        let url = server.uri();
        let stripped = url.trim_start_matches("http://");
        let mut parts = stripped.splitn(2, ':');
        (parts.next().unwrap().to_owned(), parts.next().unwrap().parse().unwrap())
    }

    fn build_orchestrator(
        server: &MockServer,
        waker: Option<GpuWaker>,
        fallback: Option<Arc<dyn FallbackTranscriber>>,
    ) -> TranscriptionOrchestrator {
        let (host, port) = host_port(server);
        let probe = GpuHealthProbe::new(&host, port, None);
        let poller = GpuSubmitPoller::new(SubmitPollerConfig {
            host,
            port,
            worker_token: None,
            submit_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
        });
        TranscriptionOrchestrator::new(probe, waker, poller, fallback)
    }

    #[tokio::test]
    async fn happy_path_async_worker() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .mount(&server).await;
        Mock::given(method("POST")).and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"job_id": "abc"})))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/jobs/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "abc", "status": "completed",
                "result": {"segments": [], "formatted": "", "stats": {"total_segments": 0, "mic_segments": 0, "tab_segments": 0, "device": "cuda", "model": "m"}},
            })))
            .mount(&server).await;

        let orchestrator = build_orchestrator(&server, None, None);
        let result = orchestrator
            .transcribe(None, None, &TranscriptionMetadata::default(), "job-1", None)
            .await;
        assert!(result.success);
        assert!(!result.used_fallback);
    }

    #[tokio::test]
    async fn falls_back_when_gpu_submit_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .mount(&server).await;
        Mock::given(method("POST")).and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server).await;

        struct StubFallback;
        #[async_trait::async_trait]
        impl FallbackTranscriber for StubFallback {
            async fn transcribe(
                &self,
                _mic: Option<&Path>,
                _tab: Option<&Path>,
                _metadata: &TranscriptionMetadata,
            ) -> TranscriptionResult {
                TranscriptionResult { success: true, segments: None, formatted: None, stats: None, error: None, used_fallback: false }
            }
        }

        let orchestrator = build_orchestrator(&server, None, Some(Arc::new(StubFallback)));
        let result = orchestrator
            .transcribe(None, None, &TranscriptionMetadata::default(), "job-1", None)
            .await;
        assert!(result.success);
        assert!(result.used_fallback);
    }

    #[tokio::test]
    async fn no_fallback_configured_yields_unreachable_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server).await;

        let orchestrator = build_orchestrator(&server, None, None);
        let result = orchestrator
            .transcribe(None, None, &TranscriptionMetadata::default(), "job-1", None)
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn cold_gpu_wakes_via_smart_plug_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .mount(&server).await;
        Mock::given(method("POST")).and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"job_id": "abc"})))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/jobs/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "abc", "status": "completed",
                "result": {"segments": [], "formatted": "", "stats": {"total_segments": 0, "mic_segments": 0, "tab_segments": 0, "device": "cuda", "model": "m"}},
            })))
            .mount(&server).await;

        struct CountingPlug(std::sync::atomic::AtomicUsize);
        #[async_trait::async_trait]
        impl SmartPlugActuator for CountingPlug {
            fn is_configured(&self) -> bool { true }
            async fn turn_on(&self) -> bool {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                true
            }
            async fn turn_off(&self) -> bool { true }
            async fn is_on(&self) -> Option<bool> { Some(true) }
        }
        let plug = Arc::new(CountingPlug(std::sync::atomic::AtomicUsize::new(0)));

        let (host, port) = host_port(&server);
        let waker = GpuWaker::new(
            plug.clone(),
            GpuHealthProbe::new(&host, port, None),
            Duration::from_secs(10),
        )
        .with_check_interval(Duration::from_millis(10));

        let orchestrator = build_orchestrator(&server, Some(waker), None);
        let result = orchestrator
            .transcribe(None, None, &TranscriptionMetadata::default(), "job-1", None)
            .await;
        assert!(result.success);
        assert_eq!(plug.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
