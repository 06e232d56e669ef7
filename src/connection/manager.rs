//! The connection manager service.
//!
//! # Responsibilities
//! - Initialize networks by probing their candidates in order
//! - Hand out validated transports to callers
//! - Route transport faults into failover
//! - Own the health monitor task and per-network recovery tasks
//!
//! # Design Decisions
//! - Explicitly constructed and cheaply cloneable; no global instance
//! - Runtime failures after initialization are absorbed and reported as
//!   events, never returned to callers
//! - Background tasks hold weak references to the manager

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::blockchain::client::AlloyConnector;
use crate::blockchain::transport::{Connector, RpcTransport};
use crate::blockchain::types::{ChainId, TransportFault};
use crate::config::schema::{ConnectionConfig, ManagerConfig, NetworkConfig};
use crate::connection::errors::{ConnectionError, ConnectionResult, ProbeError};
use crate::connection::reconnect::ReconnectOutcome;
use crate::connection::state::{ConnectionStatus, NetworkSlot, NetworkStatus};
use crate::endpoint::candidate::{build_candidates, EndpointCandidate};
use crate::endpoint::fallbacks::PublicFallbacks;
use crate::endpoint::probe::{probe, ProbeReport, ProbedEndpoint};
use crate::events::{ConnectionEvent, EventBus};
use crate::health::active::HealthMonitor;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

pub(crate) type Slot<C> = NetworkSlot<<C as Connector>::Transport>;

/// A network connection that passed its probe but is not stored yet.
pub(crate) struct Established<T> {
    pub candidates: Vec<EndpointCandidate>,
    pub index: usize,
    pub transport: Arc<T>,
    pub report: ProbeReport,
}

struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

pub(crate) struct Inner<C: Connector> {
    connector: C,
    settings: ConnectionConfig,
    fallbacks: PublicFallbacks,
    networks: DashMap<String, Arc<Slot<C>>>,
    events: EventBus,
    monitor: Mutex<Option<MonitorHandle>>,
}

/// Keeps one live, chain-id-verified RPC connection per configured network.
pub struct ConnectionManager<C: Connector = AlloyConnector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Non-owning handle used by background tasks.
pub(crate) struct WeakManager<C: Connector> {
    inner: Weak<Inner<C>>,
}

impl<C: Connector> WeakManager<C> {
    pub fn upgrade(&self) -> Option<ConnectionManager<C>> {
        self.inner.upgrade().map(|inner| ConnectionManager { inner })
    }
}

impl ConnectionManager<AlloyConnector> {
    /// Build a manager backed by alloy providers from loaded configuration.
    pub fn from_config(config: &ManagerConfig) -> Self {
        let fallbacks =
            PublicFallbacks::from_config(config.builtin_public_fallbacks, &config.public_fallbacks);
        Self::new(AlloyConnector, config.connection.clone(), fallbacks)
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, settings: ConnectionConfig, fallbacks: PublicFallbacks) -> Self {
        let events = EventBus::new(settings.event_buffer);
        Self {
            inner: Arc::new(Inner {
                connector,
                settings,
                fallbacks,
                networks: DashMap::new(),
                events,
                monitor: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &ConnectionConfig {
        &self.inner.settings
    }

    /// Subscribe to connection state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    /// Connect a network through the first candidate endpoint that passes its probe.
    ///
    /// Re-initializing a tracked network replaces its connection on success
    /// and leaves it untouched on failure.
    ///
    /// # Errors
    /// - [`ConnectionError::Configuration`] if the network has no usable endpoint
    /// - [`ConnectionError::AllProvidersFailed`] if every candidate failed
    pub async fn initialize_connection(&self, config: NetworkConfig) -> ConnectionResult<()> {
        let established = self.establish(&config).await?;
        let Established {
            candidates,
            index,
            transport,
            report,
        } = established;

        let url = candidates[index].url.clone();
        let slot = Arc::new(NetworkSlot::new(config, candidates, index, transport.clone(), report));
        let name = slot.name.clone();

        // Recovery on the record being replaced must not run past the swap.
        let previous = self.inner.networks.get(&name).map(|s| Arc::clone(s.value()));
        let _previous_writer = match &previous {
            Some(previous) => {
                previous.cancel_recovery();
                Some(previous.writer.lock().await)
            }
            None => None,
        };

        if let Some(replaced) = self.inner.networks.insert(name.clone(), slot.clone()) {
            tracing::info!(network = %name, "Replacing existing connection");
            replaced.detach();
        }
        self.attach_listener(&slot, transport.as_ref(), 0);

        metrics::record_network_health(&name, true);
        metrics::record_active_endpoint(&name, index);
        tracing::info!(
            network = %name,
            chain_id = %slot.chain_id(),
            url = %url,
            index,
            block_number = report.block_number,
            "Connection established"
        );
        self.inner.events.emit(ConnectionEvent::ConnectionEstablished {
            network: name,
            provider: url,
            provider_index: index,
        });
        Ok(())
    }

    /// The active transport of a healthy network.
    ///
    /// # Errors
    /// - [`ConnectionError::NetworkNotConnected`] for unknown networks
    /// - [`ConnectionError::NetworkUnhealthy`] while the network is failing
    pub fn get_provider(&self, network: &str) -> ConnectionResult<Arc<C::Transport>> {
        let slot = self.slot(network)?;
        let state = slot.state.read();
        if !state.is_healthy {
            return Err(ConnectionError::NetworkUnhealthy(network.to_string()));
        }
        Ok(state.active.clone())
    }

    pub fn is_network_healthy(&self, network: &str) -> bool {
        self.inner
            .networks
            .get(network)
            .is_some_and(|slot| slot.is_healthy())
    }

    /// Snapshot of every tracked network.
    pub fn get_connection_status(&self) -> ConnectionStatus {
        let networks = self
            .inner
            .networks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().status()))
            .collect();
        ConnectionStatus { networks }
    }

    pub fn network_status(&self, network: &str) -> Option<NetworkStatus> {
        self.inner.networks.get(network).map(|slot| slot.status())
    }

    /// Reset a network's reconnection counter and reconnect it now.
    ///
    /// A scheduled reconnection that is still waiting out its delay is
    /// cancelled and replaced by this one. The cycle runs as the network's
    /// recovery task, so `stop_health_monitoring` and `shutdown` cancel it;
    /// a cancelled cycle reports [`ReconnectOutcome::Failed`].
    ///
    /// # Errors
    /// [`ConnectionError::NetworkNotConnected`] for unknown networks.
    pub async fn force_reconnect(&self, network: &str) -> ConnectionResult<ReconnectOutcome> {
        let slot = self.slot(network)?;
        tracing::info!(network = %network, "Forced reconnection requested");

        let (tx, rx) = oneshot::channel();
        let manager = self.clone();
        let target = slot.clone();
        slot.replace_recovery(tokio::spawn(async move {
            let outcome = manager.reconnect(&target, true).await;
            let _ = tx.send(outcome);
        }));

        Ok(rx.await.unwrap_or_else(|_| {
            tracing::info!(network = %network, "Forced reconnection cancelled");
            ReconnectOutcome::Failed
        }))
    }

    /// Start the periodic health monitor. Does nothing if it is already running.
    pub fn start_health_monitoring(&self) {
        let mut monitor = self.inner.monitor.lock();
        if monitor.as_ref().is_some_and(|m| !m.task.is_finished()) {
            tracing::debug!("Health monitoring already running");
            return;
        }

        let shutdown = Shutdown::new();
        let task = tokio::spawn(HealthMonitor::new(self).run(shutdown.subscribe()));
        *monitor = Some(MonitorHandle { shutdown, task });
    }

    /// Stop the health monitor and cancel pending reconnections.
    pub fn stop_health_monitoring(&self) {
        if let Some(handle) = self.inner.monitor.lock().take() {
            handle.shutdown.trigger();
            handle.task.abort();
            tracing::info!("Health monitoring stopped");
        }
        for slot in self.inner.networks.iter() {
            slot.cancel_recovery();
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner
            .monitor
            .lock()
            .as_ref()
            .is_some_and(|m| !m.task.is_finished())
    }

    /// Stop monitoring, detach every listener and forget all networks.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        self.stop_health_monitoring();
        let mut removed = 0usize;
        self.inner.networks.retain(|_, slot| {
            slot.detach();
            removed += 1;
            false
        });
        if removed > 0 {
            tracing::info!(networks = removed, "Connection manager shut down");
        }
    }

    // --- Internals shared with failover, reconnection and health checks ---

    pub(crate) fn downgrade(&self) -> WeakManager<C> {
        WeakManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub(crate) fn slot(&self, network: &str) -> ConnectionResult<Arc<Slot<C>>> {
        self.inner
            .networks
            .get(network)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| ConnectionError::NetworkNotConnected(network.to_string()))
    }

    pub(crate) fn tracked_networks(&self) -> Vec<Arc<Slot<C>>> {
        self.inner.networks.iter().map(|slot| Arc::clone(slot.value())).collect()
    }

    /// Whether `slot` is still the tracked record of its network.
    pub(crate) fn is_tracked(&self, slot: &Arc<Slot<C>>) -> bool {
        self.inner
            .networks
            .get(&slot.name)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }

    /// Build candidates and probe them in order until one passes.
    pub(crate) async fn establish(
        &self,
        config: &NetworkConfig,
    ) -> ConnectionResult<Established<C::Transport>> {
        let candidates = build_candidates(config, &self.inner.fallbacks)?;
        let expected = ChainId(config.chain_id);
        let mut last_error = None;

        for index in 0..candidates.len() {
            let result = self.probe_candidate(&config.name, &candidates[index], expected).await;
            match result {
                Ok(ProbedEndpoint { transport, report }) => {
                    return Ok(Established {
                        candidates,
                        index,
                        transport,
                        report,
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        let attempted = candidates.len();
        let Some(last_error) = last_error else {
            return Err(ConnectionError::Configuration {
                network: config.name.clone(),
            });
        };
        tracing::error!(
            network = %config.name,
            attempted,
            error = %last_error,
            "All RPC endpoints failed"
        );
        Err(ConnectionError::AllProvidersFailed {
            network: config.name.clone(),
            attempted,
            last_error,
        })
    }

    pub(crate) async fn probe_candidate(
        &self,
        network: &str,
        candidate: &EndpointCandidate,
        expected: ChainId,
    ) -> Result<ProbedEndpoint<C::Transport>, ProbeError> {
        let result = probe(
            &self.inner.connector,
            candidate,
            expected,
            self.inner.settings.probe_timeout(),
        )
        .await;

        match &result {
            Ok(probed) => {
                metrics::record_probe(network, "success");
                tracing::debug!(
                    network = %network,
                    index = candidate.index,
                    url = %candidate.url,
                    block_number = probed.report.block_number,
                    "Endpoint probe passed"
                );
            }
            Err(e) => {
                metrics::record_probe(network, e.kind());
                tracing::warn!(
                    network = %network,
                    index = candidate.index,
                    url = %candidate.url,
                    error = %e,
                    "Endpoint probe failed"
                );
            }
        }
        result
    }

    /// Listen for faults on the active handle of `slot`.
    pub(crate) fn attach_listener(&self, slot: &Arc<Slot<C>>, transport: &C::Transport, generation: u64) {
        let mut faults = transport.faults();
        let manager = self.downgrade();
        let weak_slot = Arc::downgrade(slot);

        let handle = tokio::spawn(async move {
            loop {
                match faults.recv().await {
                    Ok(fault) => {
                        if let (Some(manager), Some(slot)) = (manager.upgrade(), weak_slot.upgrade()) {
                            manager.on_transport_fault(&slot, generation, fault);
                        }
                        return;
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            }
        });
        slot.set_listener(handle);
    }

    fn on_transport_fault(&self, slot: &Arc<Slot<C>>, generation: u64, fault: TransportFault) {
        tracing::warn!(network = %slot.name, error = %fault, "Active RPC endpoint reported a fault");
        let manager = self.clone();
        let target = slot.clone();
        let started = slot.try_start_recovery(|| {
            tokio::spawn(async move {
                manager.failover(&target, Some(generation)).await;
            })
        });
        if !started {
            tracing::debug!(network = %slot.name, "Recovery already in flight, fault absorbed");
        }
    }

    /// Run a reconnection for `slot` in the background unless one is running.
    pub(crate) fn schedule_reconnect(&self, slot: &Arc<Slot<C>>) {
        let manager = self.clone();
        let target = slot.clone();
        let started = slot.try_start_recovery(|| {
            tokio::spawn(async move {
                manager.reconnect(&target, false).await;
            })
        });
        if !started {
            tracing::debug!(network = %slot.name, "Reconnection already scheduled");
        }
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("networks", &self.inner.networks.len())
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}
