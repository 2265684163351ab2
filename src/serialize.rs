//! Serializer collaborator for the transport layer
//!
//! The broker never encodes a snapshot itself; the transport hands the
//! snapshot to a serializer right before writing the response. The wire
//! format is opaque to everything upstream of the connection.

use std::io::Write;

use crate::Snapshot;

/// Converts a snapshot into wire bytes.
///
/// Implementations must be `Send + Sync`; encoding happens on whichever task
/// resolves the connection.
pub trait SnapshotSerializer: Send + Sync {
    /// Encode `snapshot` into `sink`
    fn encode(&self, snapshot: &Snapshot, sink: &mut dyn Write) -> anyhow::Result<()>;

    /// MIME type of the encoded representation
    fn content_type(&self) -> &'static str;
}

/// JSON wire encoding via serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl SnapshotSerializer for JsonSerializer {
    fn encode(&self, snapshot: &Snapshot, sink: &mut dyn Write) -> anyhow::Result<()> {
        serde_json::to_writer(sink, snapshot)?;
        Ok(())
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
