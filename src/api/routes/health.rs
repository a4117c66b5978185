use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub vector_store: String,
    pub documents: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready once the document collection answers and holds at least one passage.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let collection = &state.rag.collections().documents;
    let (store_status, documents) = match state.rag.count(collection).await {
        Ok(count) => ("connected", count),
        Err(e) => {
            tracing::warn!(error = %e, "vector store not reachable");
            ("disconnected", 0)
        }
    };

    let is_ready = store_status == "connected" && documents > 0;
    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "not_ready" }.into(),
        vector_store: store_status.into(),
        documents,
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
