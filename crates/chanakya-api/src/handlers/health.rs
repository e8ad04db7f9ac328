//! Health check handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Chunks currently in the vector index
    pub indexed_chunks: usize,
    pub uptime_seconds: u64,
    /// Chat requests served since start
    pub total_requests: u64,
}

/// Liveness check with index size
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
        (status = 500, description = "Index unreadable", body = crate::error::ApiError)
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, AppError> {
    let indexed_chunks = state.store.count().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexed_chunks,
        uptime_seconds: state.uptime_secs(),
        total_requests: state.get_request_count(),
    }))
}
