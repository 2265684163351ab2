//! Concurrent set of pending watch connections
//!
//! Membership is by object identity (`Arc::ptr_eq`); the same connection
//! object is never legitimately registered twice, and two distinct
//! connections compare unequal even if they watch the same channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::connection::WatchConnection;

/// Concurrent registry of connections awaiting resolution.
///
/// Producer tasks add and remove entries concurrently with the sweeper. The
/// internal lock is only held for list mutation and cloning, never across a
/// send, so slow clients cannot block registration or ingest.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<Vec<Arc<dyn WatchConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn WatchConnection>>> {
        // A poisoning panic cannot leave the Vec structurally broken, so
        // recover the guard instead of propagating the poison.
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a connection unconditionally
    pub fn add(&self, connection: Arc<dyn WatchConnection>) {
        self.lock().push(connection);
    }

    /// Remove a connection, returning whether it was present.
    ///
    /// Idempotent: removing an absent connection is a no-op. The boolean lets
    /// a resolution path claim a connection exactly once — whoever observes
    /// `true` owns its completion.
    pub fn remove(&self, connection: &Arc<dyn WatchConnection>) -> bool {
        let mut connections = self.lock();
        let before = connections.len();
        connections.retain(|member| !Arc::ptr_eq(member, connection));
        connections.len() < before
    }

    /// Clone the current member list for iteration.
    ///
    /// Safe to traverse while other tasks add or remove members; an add that
    /// races with the clone may or may not be observed. No ordering guarantee.
    pub fn snapshot(&self) -> Vec<Arc<dyn WatchConnection>> {
        self.lock().clone()
    }

    /// Number of pending connections
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
