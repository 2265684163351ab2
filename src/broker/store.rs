//! Latest-escalation-per-channel store
//!
//! Overwrite-only: there is no history and no TTL. Channels that stop
//! receiving watchers are never evicted, so a fleet whose channel set churns
//! over the process lifetime grows this map without bound. Known limitation,
//! left visible rather than papered over with an assumed expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Snapshot;

/// Concurrent map from channel key to the most recent escalation for it
#[derive(Default)]
pub struct EscalationStore {
    entries: Mutex<HashMap<String, Snapshot>>,
}

impl EscalationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Snapshot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the latest escalation for a channel, overwriting any prior value
    pub fn put(&self, channel: impl Into<String>, snapshot: Snapshot) {
        self.lock().insert(channel.into(), snapshot);
    }

    /// Fetch the latest escalation for a channel, if any.
    ///
    /// Reading does not consume the entry: the stored value stays available
    /// for watchers that arrive later.
    pub fn get(&self, channel: &str) -> Option<Snapshot> {
        self.lock().get(channel).cloned()
    }

    /// Number of channels with a stored escalation
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }
}
