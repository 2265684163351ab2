//! Watch connection contract implemented by the transport layer

use std::fmt;

use async_trait::async_trait;

use crate::Snapshot;

/// Errors that can occur while delivering a snapshot to a connection
#[derive(Debug)]
pub enum TransportError {
    /// The client side of the connection is gone (timed out or disconnected)
    ClientGone,

    /// Snapshot could not be encoded for the wire
    Encode(String),

    /// Underlying I/O failure while writing the response
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ClientGone => write!(f, "client disconnected before delivery"),
            TransportError::Encode(msg) => write!(f, "failed to encode snapshot: {}", msg),
            TransportError::Io(err) => write!(f, "I/O error during delivery: {}", err),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

/// A held-open watch request, owned by the transport layer and handed to the
/// broker at registration time.
///
/// A connection is completed exactly once, via either `send` (data) or
/// `signal_empty` (keepalive). The broker enforces this by claiming a
/// connection out of the registry before attempting either; implementations
/// should additionally treat their completion slot as take-once so a late
/// call fails with [`TransportError::ClientGone`] instead of double-writing.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the broker invokes them from
/// producer tasks and from the sweeper task.
#[async_trait]
pub trait WatchConnection: Send + Sync {
    /// Channel this connection is waiting on.
    ///
    /// `None` means the connection subscribes to heartbeats only. The value
    /// is immutable after registration.
    fn channel(&self) -> Option<&str>;

    /// Complete the connection with encoded snapshot data.
    ///
    /// Terminal. Serialization and the response write happen here, outside
    /// any broker lock, so a slow client cannot stall ingest.
    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError>;

    /// Complete the connection with an empty keepalive response.
    ///
    /// Terminal, mutually exclusive with `send`.
    async fn signal_empty(&self);
}
