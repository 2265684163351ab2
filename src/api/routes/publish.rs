//! Ingest endpoints for upstream monitoring producers

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::trace;

use crate::api::error::ApiResult;
use crate::api::state::ApiState;
use crate::{Severity, Snapshot};

/// Body of a publish request.
///
/// `channel` is only meaningful for escalations; `captured_at` defaults to
/// the hub's receive time when the producer does not stamp it.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    /// Identifier of the observed server
    pub source: String,

    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,

    /// Opaque monitoring payload
    pub payload: serde_json::Value,
}

impl PublishRequest {
    fn into_snapshot(self, severity: Severity) -> Snapshot {
        Snapshot {
            severity,
            channel: self.channel,
            source: self.source,
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
            payload: self.payload,
        }
    }
}

/// POST /api/v1/publish/heartbeat
///
/// Fans the snapshot out to every channel-less watcher before returning, so
/// `202` means the fan-out pass for the registrants of the moment is done.
pub async fn publish_heartbeat(
    State(state): State<ApiState>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<StatusCode> {
    trace!(source = %request.source, "heartbeat published");

    let mut snapshot = request.into_snapshot(Severity::Heartbeat);
    // Heartbeats carry no channel, whatever the producer sent
    snapshot.channel = None;

    state.broker.publish_heartbeat(snapshot).await;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/publish/escalation
///
/// Requires a non-empty `channel`; delivery happens on the next sweep.
pub async fn publish_escalation(
    State(state): State<ApiState>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<StatusCode> {
    trace!(source = %request.source, channel = ?request.channel, "escalation published");

    let snapshot = request.into_snapshot(Severity::Escalation);
    state.broker.publish_escalation(snapshot)?;
    Ok(StatusCode::ACCEPTED)
}
