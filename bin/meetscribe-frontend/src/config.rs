//! Frontend configuration, loaded from environment variables.

use std::time::Duration;

/// Runtime configuration for meetscribe-frontend. Every field has a
/// sensible default so the service works out-of-the-box without any
/// environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,

    /// Root for persisted data (the database lives under here unless
    /// `database_url` is set explicitly).
    pub data_dir: String,

    /// Audio root; `upload_dir/<job_id>/{mic_*,tab_*}` holds uploaded
    /// audio.
    pub upload_dir: String,

    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,
    pub log_json: bool,

    /// Bearer token required on `/api/*`. `None` disables auth.
    pub api_token: Option<String>,

    /// Comma-separated list of allowed CORS origins. `None` allows all.
    pub cors_allowed_origins: Option<String>,

    /// Terminal frontend jobs older than this are garbage-collected at
    /// startup.
    pub job_ttl_hours: i64,

    pub gpu_host: String,
    pub gpu_worker_port: u16,
    pub gpu_worker_token: Option<String>,
    pub gpu_timeout: Duration,
    pub gpu_submit_timeout: Duration,
    pub gpu_poll_interval: Duration,

    pub fallback_enabled: bool,
    pub fallback_model_size: String,
    pub fallback_timeout: Duration,

    pub smart_plug_enabled: bool,
    pub smart_plug_device_id: String,
    pub smart_plug_ip_address: String,
    pub smart_plug_local_key: String,
    pub smart_plug_version: String,
    pub smart_plug_boot_wait_time: Duration,

    pub local_speaker_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("MEETSCRIBE_BIND", "0.0.0.0:8000"),
            data_dir: env_or("MEETSCRIBE_DATA_DIR", "./data"),
            upload_dir: env_or("MEETSCRIBE_UPLOAD_DIR", "./data/uploads"),
            database_url: env_or("MEETSCRIBE_DATABASE_URL", "sqlite://meetscribe.db?mode=rwc"),
            log_level: env_or("MEETSCRIBE_LOG", "info"),
            log_json: parse_bool_env("MEETSCRIBE_LOG_JSON", false),
            api_token: std::env::var("MEETSCRIBE_API_TOKEN").ok(),
            cors_allowed_origins: std::env::var("MEETSCRIBE_CORS_ORIGINS").ok(),
            job_ttl_hours: parse_env("MEETSCRIBE_JOB_TTL_HOURS", 24),

            gpu_host: env_or("MEETSCRIBE_GPU_HOST", "127.0.0.1"),
            gpu_worker_port: parse_env("MEETSCRIBE_GPU_WORKER_PORT", 8001),
            gpu_worker_token: std::env::var("MEETSCRIBE_GPU_WORKER_TOKEN").ok(),
            gpu_timeout: Duration::from_secs(parse_env("MEETSCRIBE_GPU_TIMEOUT_SECS", 900)),
            gpu_submit_timeout: Duration::from_secs(parse_env("MEETSCRIBE_GPU_SUBMIT_TIMEOUT_SECS", 10)),
            gpu_poll_interval: Duration::from_millis(parse_env("MEETSCRIBE_GPU_POLL_INTERVAL_MS", 2000)),

            fallback_enabled: parse_bool_env("MEETSCRIBE_FALLBACK_ENABLED", false),
            fallback_model_size: env_or("MEETSCRIBE_FALLBACK_MODEL_SIZE", "base"),
            fallback_timeout: Duration::from_secs(parse_env("MEETSCRIBE_FALLBACK_TIMEOUT_SECS", 600)),

            smart_plug_enabled: parse_bool_env("MEETSCRIBE_SMART_PLUG_ENABLED", false),
            smart_plug_device_id: env_or("MEETSCRIBE_SMART_PLUG_DEVICE_ID", ""),
            smart_plug_ip_address: env_or("MEETSCRIBE_SMART_PLUG_IP", ""),
            smart_plug_local_key: env_or("MEETSCRIBE_SMART_PLUG_LOCAL_KEY", ""),
            smart_plug_version: env_or("MEETSCRIBE_SMART_PLUG_VERSION", "3.3"),
            smart_plug_boot_wait_time: Duration::from_secs(parse_env("MEETSCRIBE_SMART_PLUG_BOOT_WAIT_SECS", 120)),

            local_speaker_name: env_or("MEETSCRIBE_LOCAL_SPEAKER_NAME", "local_speaker"),
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
