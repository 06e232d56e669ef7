//! Connection event broadcasting.

use serde::Serialize;
use tokio::sync::broadcast;
use url::Url;

/// A state transition of one network's connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// `initialize_connection` found a working endpoint.
    ConnectionEstablished {
        network: String,
        provider: Url,
        provider_index: usize,
    },
    /// A runtime fault was recovered by switching endpoints.
    FailoverSuccess {
        network: String,
        provider_index: usize,
    },
    /// No other endpoint answered after a runtime fault.
    FailoverFailed { network: String },
    /// A scheduled reconnection rebuilt the connection from scratch.
    ReconnectionSuccess { network: String, attempts: u32 },
    /// Automatic reconnection gave up for this network.
    ReconnectionFailed { network: String, attempts: u32 },
}

impl ConnectionEvent {
    pub fn network(&self) -> &str {
        match self {
            ConnectionEvent::ConnectionEstablished { network, .. }
            | ConnectionEvent::FailoverSuccess { network, .. }
            | ConnectionEvent::FailoverFailed { network }
            | ConnectionEvent::ReconnectionSuccess { network, .. }
            | ConnectionEvent::ReconnectionFailed { network, .. } => network,
        }
    }

    /// Event name as used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::ConnectionEstablished { .. } => "connection_established",
            ConnectionEvent::FailoverSuccess { .. } => "failover_success",
            ConnectionEvent::FailoverFailed { .. } => "failover_failed",
            ConnectionEvent::ReconnectionSuccess { .. } => "reconnection_success",
            ConnectionEvent::ReconnectionFailed { .. } => "reconnection_failed",
        }
    }
}

/// Publish/subscribe channel for [`ConnectionEvent`]s.
///
/// Slow subscribers lag and lose the oldest events rather than blocking
/// the manager.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to every current subscriber.
    pub fn emit(&self, event: ConnectionEvent) {
        tracing::debug!(event = event.name(), network = %event.network(), "Connection event");
        // Having no subscribers is not an error.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
