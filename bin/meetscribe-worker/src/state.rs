//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use meetscribe_worker_engine::WorkerJobEngine;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<WorkerJobEngine>,
}
