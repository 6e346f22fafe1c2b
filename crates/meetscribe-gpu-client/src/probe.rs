//! `GET /health` reachability check against the worker. Every failure
//! mode (timeout, connection refusal, malformed body) collapses to
//! `false` — it never propagates an error, matching
//! `gpu_client.py::is_gpu_available`'s blanket `except Exception:
//! return False`.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct GpuHealthProbe {
    client: reqwest::Client,
    base_url: String,
    worker_token: Option<String>,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl GpuHealthProbe {
    pub fn new(host: &str, port: u16, worker_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DEFAULT_PROBE_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            base_url: format!("http://{host}:{port}"),
            worker_token,
        }
    }

    pub async fn is_available(&self) -> bool {
        let mut request = self.client.get(format!("{}/health", self.base_url));
        if let Some(token) = &self.worker_token {
            request = request.header("X-Worker-Token", token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                debug!(%err, "health probe transport error");
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(status = %response.status(), "health probe non-200");
            return false;
        }

        match response.json::<HealthBody>().await {
            Ok(body) => body.status == "ok",
            Err(err) => {
                debug!(%err, "health probe body did not parse");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe_for(server: &MockServer) -> GpuHealthProbe {
        let url = server.uri();
        let (host, port) = split_host_port(&url);
        GpuHealthProbe::new(&host, port, None)
    }

    fn split_host_port(url: &str) -> (String, u16) {
        let stripped = url.trim_start_matches("http://");
        let mut parts = stripped.splitn(2, ':');
        (parts.next().unwrap().to_owned(), parts.next().unwrap().parse().unwrap())
    }

    #[tokio::test]
    async fn healthy_worker_reports_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok", "model": "large-v3", "device": "cuda",
                "model_loaded": true, "locked": false,
            })))
            .mount(&server)
            .await;

        assert!(probe_for(&server).is_available().await);
    }

    #[tokio::test]
    async fn non_200_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!probe_for(&server).is_available().await);
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let probe = GpuHealthProbe::new("127.0.0.1", 1, None);
        assert!(!probe.is_available().await);
    }
}
