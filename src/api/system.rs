use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// GET /api/health
/// Liveness plus a database round trip
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let database = match state.store().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!("Health check database ping failed: {e}");
            return Err(ApiError::DatabaseError(e.to_string()));
        }
    };

    Ok(Json(HealthResponse {
        success: true,
        status: "ok".to_string(),
        database,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}
