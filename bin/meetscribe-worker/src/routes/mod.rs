mod health;
mod jobs;
mod transcribe;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::auth::check_worker_auth;
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::get_health))
        .route("/transcribe", post(transcribe::transcribe))
        .route("/jobs/{id}", get(jobs::get_job))
        .route_layer(middleware::from_fn_with_state(state.clone(), check_worker_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
