//! meetscribe-frontend – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Assemble the dispatch orchestrator (GPU probe/waker/poller, optional fallback).
//! 5. Clean up stale terminal jobs left over from a previous run.
//! 6. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use meetscribe_db::{JobStore, MeetingRepository};
use meetscribe_gpu_client::{GpuHealthProbe, GpuSubmitPoller, GpuWaker, SubmitPollerConfig};
use meetscribe_orchestrator::{DisabledFallback, TranscriptionOrchestrator};
use meetscribe_smart_plug::{NullSmartPlug, SmartPlugActuator, SmartPlugConfig, TuyaSmartPlug};
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
                    "WARN: MEETSCRIBE_LOG='{}' is not a valid tracing filter ({}); \
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

    info!(version = env!("CARGO_PKG_VERSION"), "meetscribe-frontend starting");

    // -- 3. Database --
    tokio::fs::create_dir_all(&cfg.data_dir).await.ok();
    tokio::fs::create_dir_all(&cfg.upload_dir).await.ok();
    let pool = meetscribe_db::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    let jobs = Arc::new(JobStore::new(pool.clone()));
    let meetings = Arc::new(MeetingRepository::new(pool));

    // -- 4. Dispatch orchestrator --
    let probe = GpuHealthProbe::new(&cfg.gpu_host, cfg.gpu_worker_port, cfg.gpu_worker_token.clone());

    let smart_plug: std::sync::Arc<dyn SmartPlugActuator> = if cfg.smart_plug_enabled {
        std::sync::Arc::new(TuyaSmartPlug::new(SmartPlugConfig {
            enabled: cfg.smart_plug_enabled,
            device_id: cfg.smart_plug_device_id.clone(),
            ip_address: cfg.smart_plug_ip_address.clone(),
            local_key: cfg.smart_plug_local_key.clone(),
            version: cfg.smart_plug_version.clone(),
        }))
    } else {
        std::sync::Arc::new(NullSmartPlug)
    };
    let waker = if smart_plug.is_configured() {
        Some(GpuWaker::new(
            smart_plug,
            GpuHealthProbe::new(&cfg.gpu_host, cfg.gpu_worker_port, cfg.gpu_worker_token.clone()),
            cfg.smart_plug_boot_wait_time,
        ))
    } else {
        None
    };

    let poller = GpuSubmitPoller::new(SubmitPollerConfig {
        host: cfg.gpu_host.clone(),
        port: cfg.gpu_worker_port,
        worker_token: cfg.gpu_worker_token.clone(),
        submit_timeout: cfg.gpu_submit_timeout,
        timeout: cfg.gpu_timeout,
        poll_interval: cfg.gpu_poll_interval,
    });

    let fallback: Option<std::sync::Arc<dyn meetscribe_orchestrator::FallbackTranscriber>> = if cfg.fallback_enabled {
        warn!("fallback enabled in config but no local CPU transcriber is wired up; falling back will fail");
        Some(std::sync::Arc::new(DisabledFallback))
    } else {
        None
    };

    let orchestrator = Arc::new(TranscriptionOrchestrator::new(probe, waker, poller, fallback));

    // -- 5. Stale job cleanup --
    match jobs.cleanup_old_jobs(cfg.job_ttl_hours).await {
        Ok(count) if count > 0 => info!(count, "cleaned up stale terminal jobs"),
        Ok(_) => {}
        Err(err) => warn!(%err, "failed to clean up stale jobs"),
    }

    // -- 6. Shared application state --
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        jobs,
        meetings,
        orchestrator,
    });

    // -- 7. HTTP server with graceful shutdown --
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("meetscribe-frontend stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
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
