use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let provider_reachable = state
        .pipeline
        .provider()
        .health_check()
        .await
        .unwrap_or(false);

    Json(json!({
        "status": "ok",
        "chunks": state.pipeline.chunk_count(),
        "model": state.settings.llm.model_name,
        "provider_reachable": provider_reachable,
    }))
}
