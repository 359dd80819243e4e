/// Health check endpoint
///
/// ```text
/// GET /api/health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "storage": "connected" }
/// ```
///
/// A failed storage ping reports `degraded`, still with status 200.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state.stores.health.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: if storage == "connected" { "healthy" } else { "degraded" }.to_string(),
        version: taskhub_shared::VERSION.to_string(),
        storage: storage.to_string(),
    })
}
