//! meetscribe-worker – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the pipeline (recognizer/diarizer/config) and job engine.
//! 4. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use meetscribe_worker_engine::{
    NullDiarizer, PipelineConfig, PlaceholderRecognizer, WorkerJobEngine, WorkerJobStore, WorkerPipeline,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -- 1. Configuration --
    let cfg = Config::from_env();

    // -- 2. Tracing --
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: MEETSCRIBE_WORKER_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "meetscribe-worker starting");

    // -- 3. Pipeline + job engine --
    tokio::fs::create_dir_all(&cfg.work_dir).await.ok();

    let pipeline_config = PipelineConfig {
        local_speaker_name: cfg.local_speaker_name.clone(),
        ffmpeg_timeout: cfg.ffmpeg_timeout,
        diarization_timeout: cfg.diarization_timeout,
        device: cfg.device.clone(),
        model: cfg.model.clone(),
    };
    let pipeline = WorkerPipeline::new(Arc::new(PlaceholderRecognizer), Arc::new(NullDiarizer), pipeline_config);
    let store = Arc::new(WorkerJobStore::new(cfg.job_history_limit));
    let engine = Arc::new(WorkerJobEngine::new(pipeline, store));

    // -- 4. Shared application state --
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        engine,
    });

    // -- 5. HTTP server with graceful shutdown --
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("meetscribe-worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
