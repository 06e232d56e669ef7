//! Bounded reconnection.
//!
//! # State Machine
//! ```text
//! Idle → Retrying: health check failed, attempts < max
//!     wait fixed delay → rebuild candidates from config → probe in order
//! Retrying → Succeeded: re-initialization passed (attempts reset to 0)
//! Retrying → failover on the stale candidate list when re-initialization fails
//! Idle → GaveUp: attempts >= max, no probe; only force_reconnect resets
//! ```
//!
//! # Design Decisions
//! - Fixed delay between attempts, no exponential backoff
//! - The delay is awaited inside the network's own task; other networks
//!   keep being checked and failed over meanwhile

use std::sync::Arc;

use serde::Serialize;
use tokio::time;

use crate::blockchain::transport::Connector;
use crate::connection::manager::{ConnectionManager, Established, Slot};
use crate::events::ConnectionEvent;
use crate::observability::metrics;

/// Result of one reconnection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectOutcome {
    /// Full re-initialization succeeded.
    Reconnected,
    /// Re-initialization failed but failover found a working endpoint.
    FailedOver,
    /// Neither re-initialization nor failover found a working endpoint.
    Failed,
    /// The attempt budget is exhausted; nothing was probed.
    GaveUp,
}

impl ReconnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ReconnectOutcome::Reconnected | ReconnectOutcome::FailedOver)
    }

    fn label(&self) -> &'static str {
        match self {
            ReconnectOutcome::Reconnected => "reconnected",
            ReconnectOutcome::FailedOver => "failed_over",
            ReconnectOutcome::Failed => "failed",
            ReconnectOutcome::GaveUp => "gave_up",
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Run one reconnection cycle for `slot`.
    ///
    /// With `force` the attempt counter is reset first and the exhausted
    /// budget guard is skipped.
    pub(crate) async fn reconnect(&self, slot: &Arc<Slot<C>>, force: bool) -> ReconnectOutcome {
        let _writer = slot.writer.lock().await;
        if !self.is_tracked(slot) {
            return ReconnectOutcome::Failed;
        }

        let max_attempts = self.settings().max_reconnect_attempts;
        let attempt = {
            let mut state = slot.state.write();
            if force {
                state.reconnect_attempts = 0;
            }
            if state.reconnect_attempts >= max_attempts && !force {
                Err(state.reconnect_attempts)
            } else {
                state.reconnect_attempts += 1;
                Ok(state.reconnect_attempts)
            }
        };

        let attempt = match attempt {
            Ok(attempt) => attempt,
            Err(attempts) => {
                tracing::error!(
                    network = %slot.name,
                    attempts,
                    "Maximum reconnection attempts reached, automatic recovery stopped"
                );
                metrics::record_reconnect(&slot.name, ReconnectOutcome::GaveUp.label());
                self.events().emit(ConnectionEvent::ReconnectionFailed {
                    network: slot.name.clone(),
                    attempts,
                });
                return ReconnectOutcome::GaveUp;
            }
        };

        let delay = self.settings().reconnect_delay();
        tracing::info!(
            network = %slot.name,
            attempt,
            max_attempts,
            delay_secs = delay.as_secs(),
            "Reconnecting"
        );
        time::sleep(delay).await;
        if !self.is_tracked(slot) {
            tracing::debug!(network = %slot.name, "Network removed during reconnection delay");
            return ReconnectOutcome::Failed;
        }

        let outcome = match self.establish(&slot.config).await {
            Ok(_) if !self.is_tracked(slot) => {
                tracing::debug!(network = %slot.name, "Network removed during reconnection");
                return ReconnectOutcome::Failed;
            }
            Ok(Established {
                candidates,
                index,
                transport,
                report,
            }) => {
                let url = candidates[index].url.clone();
                let generation = slot.replace_connection(candidates, index, transport.clone(), report);
                self.attach_listener(slot, transport.as_ref(), generation);

                metrics::record_network_health(&slot.name, true);
                metrics::record_active_endpoint(&slot.name, index);
                tracing::info!(network = %slot.name, attempt, url = %url, index, "Reconnected");
                self.events().emit(ConnectionEvent::ConnectionEstablished {
                    network: slot.name.clone(),
                    provider: url,
                    provider_index: index,
                });
                self.events().emit(ConnectionEvent::ReconnectionSuccess {
                    network: slot.name.clone(),
                    attempts: attempt,
                });
                ReconnectOutcome::Reconnected
            }
            Err(e) => {
                tracing::warn!(
                    network = %slot.name,
                    attempt,
                    error = %e,
                    "Re-initialization failed, trying failover on existing endpoints"
                );
                if self.failover_locked(slot, None).await {
                    ReconnectOutcome::FailedOver
                } else {
                    ReconnectOutcome::Failed
                }
            }
        };

        metrics::record_reconnect(&slot.name, outcome.label());
        outcome
    }
}
