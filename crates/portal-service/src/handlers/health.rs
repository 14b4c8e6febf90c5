//! Health check handlers.
//!
//! - `/health`: liveness, plain "OK"
//! - `/api/v1/health`: JSON status with version and uptime

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Liveness probe handler. Checks no dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Handler for GET /api/v1/health
pub async fn api_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = i64::try_from(state.started_at.elapsed().as_secs()).unwrap_or(i64::MAX);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}
