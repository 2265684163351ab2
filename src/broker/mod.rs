//! Event broker distributing monitoring snapshots to long-poll watchers
//!
//! This module is the heart of the hub: it owns the registry of pending
//! connections, the per-channel escalation store, and the periodic sweep
//! that resolves channel-bound watchers.
//!
//! ## Architecture Overview
//!
//! ```text
//!   producers                      transport layer
//!       │                                │ register
//!       ▼                                ▼
//!  ┌──────────────┐  heartbeat   ┌────────────────────┐
//!  │    Broker    │─────────────▶│ ConnectionRegistry │
//!  │   (ingest)   │   fan-out    └────────────────────┘
//!  │              │                       ▲
//!  │              │  escalation           │ claim + resolve
//!  │              │──────────┐            │
//!  └──────────────┘          ▼            │
//!                    ┌─────────────────┐  │
//!                    │ EscalationStore │  │ lookup
//!                    └─────────────────┘  │
//!                            ▲            │
//!                            └────────────┤
//!                                 ┌───────┴──────┐
//!                                 │   Sweeper    │◀── interval tick
//!                                 │ (one task)   │    (overlap: skip)
//!                                 └──────────────┘
//! ```
//!
//! ## Resolution Paths
//!
//! A connection is resolved exactly once, by exactly one of:
//!
//! - **Heartbeat fan-out**: channel-less connections only, at publish time
//! - **Sweep delivery**: channel-bound connections with a stored escalation
//! - **Sweep empty-signal**: channel-bound connections with nothing stored
//!
//! The channel/no-channel partition keeps the two paths off each other's
//! connections; within a path, claiming a connection out of the registry
//! before touching it keeps concurrent invocations off the same connection.
//! Sends always happen after the claim, outside any lock.

pub mod connection;
pub mod error;
pub mod registry;
pub mod store;

pub use connection::{TransportError, WatchConnection};
pub use error::PublishError;
pub use registry::ConnectionRegistry;
pub use store::EscalationStore;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, trace, warn};

use crate::Snapshot;

/// Orchestrator wiring the registry, the store, and the ingest paths.
///
/// One instance exists per process, shared behind an `Arc` by the transport
/// layer, the producers, and the sweeper task. All methods take `&self` and
/// may be called concurrently.
#[derive(Default)]
pub struct Broker {
    registry: ConnectionRegistry,
    store: EscalationStore,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new watch connection.
    ///
    /// Called by the transport layer whenever a long-poll request arrives.
    /// The connection stays pending until a heartbeat (no channel) or a sweep
    /// (with channel) resolves it.
    pub fn register(&self, connection: Arc<dyn WatchConnection>) {
        trace!(channel = ?connection.channel(), "registering watch connection");
        self.registry.add(connection);
    }

    /// Publish a heartbeat, fanning it out to every channel-less connection
    /// currently registered.
    ///
    /// Each such connection is claimed out of the registry first and then
    /// sent to; a delivery failure is logged and swallowed, never retried.
    /// The client is expected to reconnect after any completion. Connections
    /// registered after the member snapshot was taken see the next heartbeat.
    #[instrument(skip(self, snapshot), fields(source = %snapshot.source))]
    pub async fn publish_heartbeat(&self, snapshot: Snapshot) {
        let members = self.registry.snapshot();
        trace!(pending = members.len(), "heartbeat fan-out");

        for connection in members {
            if connection.channel().is_some() {
                continue;
            }

            // Claim before sending: a concurrent heartbeat that lost the
            // claim must not complete the same connection again.
            if !self.registry.remove(&connection) {
                continue;
            }

            if let Err(e) = connection.send(&snapshot).await {
                warn!("heartbeat delivery failed, dropping connection: {e}");
            }
        }
    }

    /// Publish an escalation, storing it under its channel.
    ///
    /// Delivery is deferred to the next sweep; this call never touches the
    /// registry and never blocks on a client. A later escalation for the same
    /// channel overwrites an unread earlier one.
    #[instrument(skip(self, snapshot), fields(source = %snapshot.source))]
    pub fn publish_escalation(&self, snapshot: Snapshot) -> Result<(), PublishError> {
        let Some(channel) = snapshot.escalation_channel().map(String::from) else {
            return Err(PublishError::MissingChannel);
        };

        debug!(%channel, "storing escalation");
        self.store.put(channel, snapshot);
        Ok(())
    }

    /// Resolve every channel-bound connection currently registered.
    ///
    /// Connections with a stored escalation for their channel get it sent;
    /// the rest get an explicit empty-signal. Either way the connection is
    /// claimed out of the registry before being touched, so each one is
    /// resolved at most once. Channel-less connections are left alone.
    #[instrument(skip(self))]
    pub async fn sweep(&self) {
        let members = self.registry.snapshot();
        trace!(pending = members.len(), "sweeping channel-bound connections");

        for connection in members {
            let Some(channel) = connection.channel().map(String::from) else {
                continue;
            };

            if !self.registry.remove(&connection) {
                continue;
            }

            match self.store.get(&channel) {
                Some(snapshot) => {
                    debug!(%channel, "delivering stored escalation");
                    if let Err(e) = connection.send(&snapshot).await {
                        warn!(%channel, "escalation delivery failed, dropping connection: {e}");
                    }
                }
                None => {
                    trace!(%channel, "no escalation stored, signalling empty");
                    connection.signal_empty().await;
                }
            }
        }
    }

    /// Number of connections currently awaiting resolution
    pub fn pending_connections(&self) -> usize {
        self.registry.len()
    }

    /// Number of channels with a stored escalation
    pub fn stored_channels(&self) -> usize {
        self.store.channel_count()
    }
}

/// Commands that can be sent to the sweeper task
#[derive(Debug)]
enum SweeperCommand {
    /// Run a sweep immediately and acknowledge when it finished.
    ///
    /// Used for testing and manual triggering.
    SweepNow { respond_to: oneshot::Sender<()> },

    /// Gracefully shut down the sweeper
    Shutdown,
}

/// Task driving the periodic sweep.
///
/// Owns the timer: one tick, one sweep. The interval is fixed at spawn time
/// and constant for the life of the process. A tick that would fire while a
/// sweep is still running is skipped, not queued.
struct Sweeper {
    broker: Arc<Broker>,
    command_rx: mpsc::Receiver<SweeperCommand>,
    interval_duration: Duration,
}

impl Sweeper {
    /// Run the sweeper's main loop
    #[instrument(skip(self))]
    async fn run(mut self) {
        debug!(interval = ?self.interval_duration, "starting sweeper");

        let mut ticker = interval(self.interval_duration);
        // Overlap policy: skip. Sweeps are short and bounded by client
        // count, so dropping a missed tick loses nothing.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.broker.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SweeperCommand::SweepNow { respond_to }) => {
                            debug!("received SweepNow command");
                            self.broker.sweep().await;
                            let _ = respond_to.send(());
                        }

                        Some(SweeperCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        // Every handle dropped - exit
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("sweeper stopped");
    }
}

/// Handle for controlling the sweeper task
#[derive(Clone)]
pub struct SweeperHandle {
    sender: mpsc::Sender<SweeperCommand>,
}

impl SweeperHandle {
    /// Spawn the sweeper for a broker.
    ///
    /// `interval_duration` is the fixed sweep cadence; it bounds the
    /// worst-case latency for escalation delivery.
    pub fn spawn(broker: Arc<Broker>, interval_duration: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let sweeper = Sweeper {
            broker,
            command_rx: cmd_rx,
            interval_duration,
        };

        tokio::spawn(sweeper.run());

        Self { sender: cmd_tx }
    }

    /// Run one sweep immediately, waiting for it to complete
    pub async fn sweep_now(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(SweeperCommand::SweepNow { respond_to: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Shut down the sweeper task
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SweeperCommand::Shutdown).await;
    }
}
