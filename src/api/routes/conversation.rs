use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::status_for;
use crate::api::state::AppState;
use crate::domain::Conversation;

const MAX_TOP_K: usize = 50;

#[derive(Debug, Deserialize)]
pub struct HistorySearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistorySearchResponse {
    pub query: String,
    pub responses: Vec<String>,
}

pub async fn get_conversation(State(state): State<AppState>) -> Json<Conversation> {
    Json(state.transcript.read().await.clone())
}

pub async fn clear_conversation(State(state): State<AppState>) -> StatusCode {
    state.transcript.write().await.clear();
    StatusCode::NO_CONTENT
}

/// Semantic search over every stored turn, most similar first.
pub async fn search_history(
    State(state): State<AppState>,
    Json(request): Json<HistorySearchRequest>,
) -> Result<Json<HistorySearchResponse>, StatusCode> {
    if request.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let top_k = request
        .top_k
        .unwrap_or(state.config.config.rag.recall_top_k)
        .clamp(1, MAX_TOP_K);

    let responses = state
        .history
        .retrieve_conversation_history(&request.query, top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to search conversation history");
            status_for(&e)
        })?;

    Ok(Json(HistorySearchResponse {
        query: request.query,
        responses,
    }))
}
