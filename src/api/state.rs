//! Shared state for API handlers

use std::sync::Arc;
use std::time::Duration;

use crate::broker::Broker;
use crate::serialize::SnapshotSerializer;

/// State shared by every handler.
///
/// Cheap to clone: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct ApiState {
    /// The process-wide event broker
    pub broker: Arc<Broker>,

    /// Serializer used to encode snapshots at the transport edge
    pub serializer: Arc<dyn SnapshotSerializer>,

    /// How long a watch request is held open before the transport gives up
    /// and answers with a keepalive
    pub long_poll_timeout: Duration,
}

impl ApiState {
    pub fn new(
        broker: Arc<Broker>,
        serializer: Arc<dyn SnapshotSerializer>,
        long_poll_timeout: Duration,
    ) -> Self {
        Self {
            broker,
            serializer,
            long_poll_timeout,
        }
    }
}
