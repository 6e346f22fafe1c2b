//! Worker configuration, loaded from environment variables.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,

    /// Scratch space for one job's intermediate files; a subdirectory
    /// per job is created under here and removed once the job finishes.
    pub work_dir: String,

    pub log_level: String,
    pub log_json: bool,

    /// `X-Worker-Token` required on every request. `None` disables auth.
    pub worker_token: Option<String>,

    pub ffmpeg_timeout: Duration,
    pub diarization_timeout: Duration,

    pub device: String,
    pub model: String,
    pub local_speaker_name: String,

    /// Bounded history of terminal jobs retained in memory.
    pub job_history_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("MEETSCRIBE_WORKER_BIND", "0.0.0.0:8001"),
            work_dir: env_or("MEETSCRIBE_WORKER_WORK_DIR", "./worker-data"),
            log_level: env_or("MEETSCRIBE_WORKER_LOG", "info"),
            log_json: parse_bool_env("MEETSCRIBE_WORKER_LOG_JSON", false),
            worker_token: std::env::var("MEETSCRIBE_WORKER_TOKEN").ok(),
            ffmpeg_timeout: Duration::from_secs(parse_env("MEETSCRIBE_WORKER_FFMPEG_TIMEOUT_SECS", 300)),
            diarization_timeout: Duration::from_secs(parse_env("MEETSCRIBE_WORKER_DIARIZATION_TIMEOUT_SECS", 600)),
            device: env_or("MEETSCRIBE_WORKER_DEVICE", "cpu"),
            model: env_or("MEETSCRIBE_WORKER_MODEL", "reference"),
            local_speaker_name: env_or("MEETSCRIBE_WORKER_LOCAL_SPEAKER_NAME", "local_speaker"),
            job_history_limit: parse_env("MEETSCRIBE_WORKER_JOB_HISTORY_LIMIT", 10),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
