//! Periodic health checking of active endpoints.
//!
//! # Responsibilities
//! - Re-validate each network's active handle on a fixed interval
//! - Record the outcome on the network
//! - Hand failing networks to the reconnection scheduler

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::transport::Connector;
use crate::connection::manager::{ConnectionManager, Slot, WeakManager};
use crate::endpoint::probe::validate;
use crate::observability::metrics;

pub struct HealthMonitor<C: Connector> {
    manager: WeakManager<C>,
    interval: Duration,
}

impl<C: Connector> HealthMonitor<C> {
    pub(crate) fn new(manager: &ConnectionManager<C>) -> Self {
        Self {
            manager: manager.downgrade(),
            interval: manager.settings().health_check_interval(),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Health monitor starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(manager) = self.manager.upgrade() else {
                        tracing::debug!("Connection manager dropped, health monitor exiting");
                        break;
                    };
                    check_all(&manager).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Check every tracked network concurrently.
pub(crate) async fn check_all<C: Connector>(manager: &ConnectionManager<C>) {
    let slots = manager.tracked_networks();
    join_all(slots.iter().map(|slot| check_network(manager, slot))).await;
}

async fn check_network<C: Connector>(manager: &ConnectionManager<C>, slot: &Arc<Slot<C>>) {
    if slot.recovery_in_flight() {
        tracing::debug!(network = %slot.name, "Recovery in flight, skipping health check");
        return;
    }
    let Ok(writer) = slot.writer.try_lock() else {
        return;
    };

    let (transport, candidate, _) = slot.active_endpoint();
    let timeout = manager.settings().probe_timeout();

    match validate(transport.as_ref(), &candidate.url, slot.chain_id(), timeout).await {
        Ok(report) => {
            slot.record_check_passed(report);
            metrics::record_network_health(&slot.name, true);
            tracing::debug!(
                network = %slot.name,
                url = %candidate.url,
                block_number = report.block_number,
                "Health check passed"
            );
        }
        Err(e) => {
            slot.mark_unhealthy(e.to_string());
            metrics::record_network_health(&slot.name, false);
            tracing::warn!(
                network = %slot.name,
                url = %candidate.url,
                error = %e,
                attempts = slot.reconnect_attempts(),
                "Health check failed"
            );
            drop(writer);
            manager.schedule_reconnect(slot);
        }
    }
}
