use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    tracing::info!("answering question ({} chars)", question.chars().count());
    let answer = state.pipeline.ask(question).await?;

    Ok(Json(AskResponse { answer }))
}
