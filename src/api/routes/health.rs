//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::state::ApiState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Connections currently awaiting resolution
    pub pending_connections: usize,

    /// Channels with a stored escalation
    pub stored_channels: usize,
}

/// GET /api/v1/health
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pending_connections: state.broker.pending_connections(),
        stored_channels: state.broker.stored_channels(),
    })
}
