pub mod api;
pub mod broker;
pub mod config;
pub mod serialize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Urgency class of a snapshot.
///
/// Heartbeats are broadcast immediately to every pending watcher that is not
/// bound to a channel. Escalations are keyed by channel and held until a
/// matching watcher is resolved by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Heartbeat,
    Escalation,
}

/// A single monitoring data point published by a fleet producer.
///
/// The broker only looks at `severity` and `channel`; the payload is carried
/// through opaquely and encoded at the transport edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub severity: Severity,

    /// Escalation channel key. Present (and non-empty) for escalations,
    /// absent for heartbeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Identifier of the observed server this snapshot came from
    pub source: String,

    /// When the producer captured the snapshot
    pub captured_at: DateTime<Utc>,

    /// Opaque monitoring payload
    pub payload: serde_json::Value,
}

impl Snapshot {
    /// Create a heartbeat snapshot
    pub fn heartbeat(source: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            severity: Severity::Heartbeat,
            channel: None,
            source: source.into(),
            captured_at: Utc::now(),
            payload,
        }
    }

    /// Create an escalation snapshot for a channel
    pub fn escalation(
        source: impl Into<String>,
        channel: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            severity: Severity::Escalation,
            channel: Some(channel.into()),
            source: source.into(),
            captured_at: Utc::now(),
            payload,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.severity == Severity::Heartbeat
    }

    /// Channel key of this snapshot, treating an empty string as absent
    pub fn escalation_channel(&self) -> Option<&str> {
        self.channel.as_deref().filter(|channel| !channel.is_empty())
    }
}
