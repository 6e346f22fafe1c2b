//! Two-phase submit/poll protocol against the worker, with legacy
//! synchronous-worker fallback detection by status code (202 vs 200),
//! per `gpu_client.py`/`worker_server.py`.

use std::path::Path;
use std::time::{Duration, Instant};

use meetscribe_types::{ResultSegment, Stats, TranscriptionError, TranscriptionMetadata, TranscriptionResult};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SubmitPollerConfig {
    pub host: String,
    pub port: u16,
    pub worker_token: Option<String>,
    /// Connection timeout for the submit request.
    pub submit_timeout: Duration,
    /// Full job deadline; read timeout on submit (legacy workers block
    /// until done), and the poll loop's budget.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

pub struct GpuSubmitPoller {
    client: reqwest::Client,
    config: SubmitPollerConfig,
}

pub enum SubmitOutcome {
    /// `202 {job_id}` — proceed to phase 2.
    Accepted { worker_job_id: String },
    /// `200` with the full payload — legacy synchronous worker, no
    /// polling needed.
    Legacy(TranscriptionResult),
}

#[derive(Deserialize)]
struct AcceptedBody {
    job_id: String,
}

#[derive(Deserialize)]
struct WorkerResultPayload {
    segments: Vec<ResultSegment>,
    formatted: String,
    stats: Stats,
}

#[derive(Deserialize)]
struct JobStatusBody {
    status: String,
    #[serde(default)]
    progress_step: Option<String>,
    #[serde(default)]
    progress_detail: Option<String>,
    #[serde(default)]
    result: Option<WorkerResultPayload>,
    #[serde(default)]
    error: Option<String>,
}

impl GpuSubmitPoller {
    pub fn new(config: SubmitPollerConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.submit_timeout)
            .build()
            .expect("reqwest client builds with static config");
        Self { client, config }
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.port)
    }

    fn request_id_header(request_id: Option<&str>) -> String {
        request_id.map(str::to_owned).unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub async fn submit(
        &self,
        mic_path: Option<&Path>,
        tab_path: Option<&Path>,
        metadata: &TranscriptionMetadata,
        request_id: Option<&str>,
    ) -> Result<SubmitOutcome, TranscriptionError> {
        let request_id = Self::request_id_header(request_id);
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| TranscriptionError::Generic(e.to_string()))?;
        let mut form = reqwest::multipart::Form::new().text("metadata", metadata_json);

        if let Some(path) = mic_path {
            form = form.part("mic_file", file_part(path).await?);
        }
        if let Some(path) = tab_path {
            form = form.part("tab_file", file_part(path).await?);
        }

        let mut request = self
            .client
            .post(format!("{}/transcribe", self.base_url()))
            .multipart(form)
            .timeout(self.config.timeout)
            .header("X-Request-ID", &request_id);
        if let Some(token) = &self.config.worker_token {
            request = request.header("X-Worker-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscriptionError::SubmitRejected(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::ACCEPTED => {
                let body: AcceptedBody = response
                    .json()
                    .await
                    .map_err(|e| TranscriptionError::SubmitRejected(e.to_string()))?;
                Ok(SubmitOutcome::Accepted { worker_job_id: body.job_id })
            }
            reqwest::StatusCode::OK => {
                let body: WorkerResultPayload = response
                    .json()
                    .await
                    .map_err(|e| TranscriptionError::SubmitRejected(e.to_string()))?;
                Ok(SubmitOutcome::Legacy(TranscriptionResult {
                    success: true,
                    segments: Some(body.segments),
                    formatted: Some(body.formatted),
                    stats: Some(body.stats),
                    error: None,
                    used_fallback: false,
                }))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(TranscriptionError::AuthFailure)
            }
            other => Err(TranscriptionError::SubmitRejected(format!("status {other}"))),
        }
    }

    /// Polls `GET /jobs/{worker_job_id}` until a terminal status, an
    /// auth failure, a `404`, or the deadline (`start + timeout`)
    /// passes.
    pub async fn poll(
        &self,
        worker_job_id: &str,
        request_id: Option<&str>,
    ) -> TranscriptionResult {
        let request_id = Self::request_id_header(request_id);
        let deadline = Instant::now() + self.config.timeout;
        let mut last_progress: Option<(String, Option<String>)> = None;

        loop {
            if Instant::now() >= deadline {
                return TranscriptionResult::failure(TranscriptionError::WorkerTimeout.to_string());
            }

            tokio::time::sleep(self.config.poll_interval).await;

            let mut request = self
                .client
                .get(format!("{}/jobs/{worker_job_id}", self.base_url()))
                .header("X-Request-ID", &request_id);
            if let Some(token) = &self.config.worker_token {
                request = request.header("X-Worker-Token", token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(err) => {
                    warn!(%err, worker_job_id, "poll transport error, retrying");
                    continue;
                }
            };

            match response.status() {
                reqwest::StatusCode::OK => {
                    let body = match response.json::<JobStatusBody>().await {
                        Ok(b) => b,
                        Err(err) => {
                            warn!(%err, worker_job_id, "poll response did not parse, retrying");
                            continue;
                        }
                    };

                    match body.status.as_str() {
                        "completed" => {
                            let payload = body.result.unwrap_or(WorkerResultPayload {
                                segments: Vec::new(),
                                formatted: String::new(),
                                stats: Stats {
                                    total_segments: 0,
                                    mic_segments: 0,
                                    tab_segments: 0,
                                    device: String::new(),
                                    model: String::new(),
                                },
                            });
                            return TranscriptionResult {
                                success: true,
                                segments: Some(payload.segments),
                                formatted: Some(payload.formatted),
                                stats: Some(payload.stats),
                                error: None,
                                used_fallback: false,
                            };
                        }
                        "failed" => {
                            let error = body.error.unwrap_or_else(|| "worker job failed".to_owned());
                            return TranscriptionResult::failure(error);
                        }
                        "queued" | "processing" => {
                            let progress = (body.status.clone(), body.progress_detail.clone());
                            if last_progress.as_ref() != Some(&progress) {
                                info!(
                                    worker_job_id,
                                    step = body.progress_step.as_deref().unwrap_or(""),
                                    detail = body.progress_detail.as_deref().unwrap_or(""),
                                    "worker progress"
                                );
                                last_progress = Some(progress);
                            }
                        }
                        other => {
                            warn!(worker_job_id, status = other, "unrecognized job status, retrying");
                        }
                    }
                }
                reqwest::StatusCode::NOT_FOUND => {
                    return TranscriptionResult::failure(TranscriptionError::WorkerLost.to_string());
                }
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    return TranscriptionResult::failure(TranscriptionError::AuthFailure.to_string());
                }
                other => {
                    warn!(worker_job_id, status = %other, "unexpected poll status, retrying");
                }
            }
        }
    }
}

async fn file_part(path: &Path) -> Result<reqwest::multipart::Part, TranscriptionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| TranscriptionError::AudioError(e.to_string()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_owned());
    Ok(reqwest::multipart::Part::bytes(bytes).file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn poller_for(server: &MockServer, timeout: Duration, poll_interval: Duration) -> GpuSubmitPoller {
        let url = server.uri();
        let stripped = url.trim_start_matches("http://");
        let mut parts = stripped.splitn(2, ':');
        let host = parts.next().unwrap().to_owned();
        let port: u16 = parts.next().unwrap().parse().unwrap();
        GpuSubmitPoller::new(SubmitPollerConfig {
            host,
            port,
            worker_token: None,
            submit_timeout: Duration::from_secs(5),
            timeout,
            poll_interval,
        })
    }

    #[tokio::test]
    async fn async_worker_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"job_id": "abc"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "abc", "status": "processing", "progress_step": "transcribing_tab",
                "progress_detail": null,
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "abc", "status": "completed",
                "result": {
                    "segments": [{"speaker": "Speaker 1", "text": "hi", "start": 0.0, "end": 1.2}],
                    "formatted": "[00:00:00] Speaker 1: hi",
                    "stats": {"total_segments": 1, "mic_segments": 1, "tab_segments": 0, "device": "cuda", "model": "large-v3"},
                },
            })))
            .mount(&server)
            .await;

        let poller = poller_for(&server, Duration::from_secs(5), Duration::from_millis(10));
        let outcome = poller.submit(None, None, &TranscriptionMetadata::default(), None).await.unwrap();
        let worker_job_id = match outcome {
            SubmitOutcome::Accepted { worker_job_id } => worker_job_id,
            SubmitOutcome::Legacy(_) => panic!("expected 202"),
        };
        let result = poller.poll(&worker_job_id, None).await;
        assert!(result.success);
        assert_eq!(result.segments.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_worker_returns_result_synchronously() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "segments": [],
                "formatted": "",
                "stats": {"total_segments": 0, "mic_segments": 0, "tab_segments": 0, "device": "cpu", "model": "base"},
            })))
            .mount(&server)
            .await;

        let poller = poller_for(&server, Duration::from_secs(5), Duration::from_millis(10));
        let outcome = poller.submit(None, None, &TranscriptionMetadata::default(), None).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Legacy(r) if r.success));
    }

    #[tokio::test]
    async fn worker_restart_mid_job_surfaces_as_restart_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "x", "status": "processing",
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/x"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let poller = poller_for(&server, Duration::from_secs(5), Duration::from_millis(10));
        let result = poller.poll("x", None).await;
        assert!(!result.success);
        assert!(result.error.unwrap().to_lowercase().contains("restart"));
    }

    #[tokio::test]
    async fn poll_deadline_expires_with_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "x", "status": "processing",
            })))
            .mount(&server)
            .await;

        let poller = poller_for(&server, Duration::from_millis(200), Duration::from_millis(50));
        let result = poller.poll("x", None).await;
        assert!(!result.success);
        assert!(result.error.unwrap().to_lowercase().contains("timeout"));
    }

    #[tokio::test]
    async fn auth_failure_on_poll_fails_immediately_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/x"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let poller = poller_for(&server, Duration::from_secs(5), Duration::from_millis(10));
        let result = poller.poll("x", None).await;
        assert!(!result.success);
    }
}
