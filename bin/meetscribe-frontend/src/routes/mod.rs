//! Router assembly: CORS + request-id on every route, Bearer auth on
//! `/api/*`.

mod health;
mod meetings;
mod segments;
mod status;
mod transcripts;
mod upload;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use http::header::HeaderName;

use crate::middleware::auth::check_api_auth;
use crate::middleware::cors::cors_layer;
use crate::middleware::request_id::UuidRequestId;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn build(state: Arc<AppState>) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let api_routes = Router::new()
        .route("/upload", post(upload::upload))
        .route("/status/{job_id}", get(status::get_status))
        .route("/transcripts", get(transcripts::list_transcripts))
        .route("/transcripts/{meeting_id}", get(transcripts::get_transcript))
        .route("/meetings/{meeting_id}", patch(meetings::update_meeting).delete(meetings::delete_meeting))
        .route("/meetings/{meeting_id}/speakers", patch(meetings::rename_speaker))
        .route("/meetings/{meeting_id}/audio", get(meetings::get_audio))
        .route("/segments/{meeting_id}/{segment_id}", patch(segments::update_segment))
        .route_layer(middleware::from_fn_with_state(state.clone(), check_api_auth));

    Router::new()
        .route("/health", get(health::get_health))
        .nest("/api", api_routes)
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, UuidRequestId))
        .with_state(state)
}
