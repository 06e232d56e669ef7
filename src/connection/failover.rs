//! Failover to the next working endpoint.
//!
//! # Algorithm
//! ```text
//! failed index i, N candidates
//!     → probe (i+1) mod N, (i+2) mod N, ... (at most N-1 probes)
//!     → first pass: switch active handle, re-attach listener, failover_success
//!     → none pass: mark unhealthy, failover_failed
//! ```
//!
//! # Design Decisions
//! - Walks the existing candidate list; never rebuilds it
//! - Earliest index reached wins, no latency scoring
//! - Faults from a handle that is no longer active are ignored

use std::sync::Arc;

use crate::blockchain::transport::Connector;
use crate::connection::manager::{ConnectionManager, Slot};
use crate::endpoint::probe::ProbedEndpoint;
use crate::events::ConnectionEvent;
use crate::observability::metrics;

impl<C: Connector> ConnectionManager<C> {
    /// Fail over `slot` to another endpoint.
    ///
    /// `origin` is the generation of the handle that faulted; `None` forces
    /// the walk regardless of which handle is active.
    ///
    /// Returns whether the network ends up with a healthy endpoint.
    pub(crate) async fn failover(&self, slot: &Arc<Slot<C>>, origin: Option<u64>) -> bool {
        let _writer = slot.writer.lock().await;
        if !self.is_tracked(slot) {
            return false;
        }
        self.failover_locked(slot, origin).await
    }

    /// Failover body; the caller holds `slot.writer`.
    pub(crate) async fn failover_locked(&self, slot: &Arc<Slot<C>>, origin: Option<u64>) -> bool {
        let (candidates, failed_index, generation) = {
            let state = slot.state.read();
            (state.candidates.clone(), state.active_index, state.generation)
        };

        if origin.is_some_and(|origin| origin != generation) {
            tracing::debug!(network = %slot.name, "Ignoring fault from a replaced endpoint");
            return slot.is_healthy();
        }

        let total = candidates.len();
        tracing::info!(
            network = %slot.name,
            failed_index,
            candidates = total,
            "Starting failover"
        );

        let mut last_error = None;
        for step in 1..total {
            let index = (failed_index + step) % total;
            let candidate = &candidates[index];
            let result = self.probe_candidate(&slot.name, candidate, slot.chain_id()).await;
            match result {
                Ok(ProbedEndpoint { transport, report }) => {
                    let generation = slot.switch_endpoint(index, transport.clone(), report);
                    self.attach_listener(slot, transport.as_ref(), generation);

                    metrics::record_failover(&slot.name, true);
                    metrics::record_network_health(&slot.name, true);
                    metrics::record_active_endpoint(&slot.name, index);
                    tracing::info!(
                        network = %slot.name,
                        from_index = failed_index,
                        to_index = index,
                        url = %candidate.url,
                        "Failover succeeded"
                    );
                    self.events().emit(ConnectionEvent::FailoverSuccess {
                        network: slot.name.clone(),
                        provider_index: index,
                    });
                    return true;
                }
                Err(e) => last_error = Some(e),
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no alternative endpoint configured".to_string());
        slot.mark_unhealthy(reason.as_str());

        metrics::record_failover(&slot.name, false);
        metrics::record_network_health(&slot.name, false);
        tracing::error!(
            network = %slot.name,
            failed_index,
            error = %reason,
            "Failover failed, no endpoint available"
        );
        self.events().emit(ConnectionEvent::FailoverFailed {
            network: slot.name.clone(),
        });
        false
    }
}
