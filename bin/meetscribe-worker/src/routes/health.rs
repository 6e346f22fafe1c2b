use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model": state.config.model,
        "device": state.config.device,
        "model_loaded": true,
        "locked": state.engine.is_locked(),
        "current_job": state.engine.current_job(),
    }))
}
