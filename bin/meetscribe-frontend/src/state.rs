//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use meetscribe_db::{JobStore, MeetingRepository};
use meetscribe_orchestrator::TranscriptionOrchestrator;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: Arc<JobStore>,
    pub meetings: Arc<MeetingRepository>,
    pub orchestrator: Arc<TranscriptionOrchestrator>,
}
