//! Long-poll watch endpoint — the transport side of a connection
//!
//! A `GET /api/v1/watch` request becomes a [`LongPollConnection`] registered
//! with the broker; the handler then parks on a oneshot until the broker
//! resolves the connection or the long-poll timeout elapses.
//!
//! On timeout the handler answers `204` and walks away, but the registry
//! entry stays behind: the broker only notices the dead connection the next
//! time a heartbeat or sweep claims it, at which point the send fails with
//! `ClientGone` and the entry is dropped.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::Snapshot;
use crate::api::state::ApiState;
use crate::broker::{TransportError, WatchConnection};
use crate::serialize::SnapshotSerializer;

/// How a long-poll was completed by the broker
#[derive(Debug)]
pub enum PollOutcome {
    /// Encoded snapshot bytes to return to the client
    Data(Vec<u8>),

    /// Explicit nothing-to-say keepalive
    Empty,
}

/// Watch connection backed by an HTTP long-poll.
///
/// The completion slot is take-once: the first resolution path to take the
/// sender wins, any later attempt sees `ClientGone`. If the handler has
/// already given up (timeout), the receiver is gone and sending fails the
/// same way.
pub struct LongPollConnection {
    channel: Option<String>,
    serializer: Arc<dyn SnapshotSerializer>,
    reply: Mutex<Option<oneshot::Sender<PollOutcome>>>,
}

impl LongPollConnection {
    pub fn new(
        channel: Option<String>,
        serializer: Arc<dyn SnapshotSerializer>,
        reply: oneshot::Sender<PollOutcome>,
    ) -> Self {
        Self {
            channel,
            serializer,
            reply: Mutex::new(Some(reply)),
        }
    }

    fn take_reply(&self) -> Option<oneshot::Sender<PollOutcome>> {
        self.reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl WatchConnection for LongPollConnection {
    fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let mut buf = Vec::new();
        self.serializer
            .encode(snapshot, &mut buf)
            .map_err(|e| TransportError::Encode(e.to_string()))?;

        let Some(reply) = self.take_reply() else {
            return Err(TransportError::ClientGone);
        };

        reply
            .send(PollOutcome::Data(buf))
            .map_err(|_| TransportError::ClientGone)
    }

    async fn signal_empty(&self) {
        if let Some(reply) = self.take_reply() {
            let _ = reply.send(PollOutcome::Empty);
        }
    }
}

/// Query parameters for the watch endpoint
#[derive(Debug, Deserialize)]
pub struct WatchParams {
    /// Escalation channel to wait on; omitted or empty means heartbeats
    pub channel: Option<String>,
}

/// GET /api/v1/watch
///
/// Holds the request open until the broker resolves it or the long-poll
/// timeout fires. Data completions become `200` with the encoded snapshot,
/// everything else becomes `204`.
pub async fn watch(State(state): State<ApiState>, Query(params): Query<WatchParams>) -> Response {
    let channel = params.channel.filter(|channel| !channel.is_empty());
    trace!(channel = ?channel, "watch request arrived");

    let (reply_tx, reply_rx) = oneshot::channel();
    let connection: Arc<dyn WatchConnection> = Arc::new(LongPollConnection::new(
        channel,
        state.serializer.clone(),
        reply_tx,
    ));

    state.broker.register(connection);

    match tokio::time::timeout(state.long_poll_timeout, reply_rx).await {
        Ok(Ok(PollOutcome::Data(body))) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.serializer.content_type())],
            body,
        )
            .into_response(),

        Ok(Ok(PollOutcome::Empty)) => StatusCode::NO_CONTENT.into_response(),

        // Sender dropped without completing (broker shutdown)
        Ok(Err(_)) => StatusCode::NO_CONTENT.into_response(),

        Err(_) => {
            debug!("watch request timed out, answering with keepalive");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
