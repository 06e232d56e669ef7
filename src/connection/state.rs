//! Per-network connection state.
//!
//! # Responsibilities
//! - Hold the active endpoint, candidate list and recovery counters
//! - Hold the last observed health outcome
//! - Own the background tasks bound to one network (fault listener, recovery)
//!
//! # Design Decisions
//! - One writer at a time per network (`writer`), held across probes
//! - State reads are synchronous and never wait on a writer
//! - `active_index` always points into `candidates`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::blockchain::types::ChainId;
use crate::config::schema::NetworkConfig;
use crate::endpoint::candidate::{EndpointCandidate, EndpointSource};
use crate::endpoint::probe::ProbeReport;

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Mutable connection record of one network.
pub(crate) struct ConnectionState<T> {
    pub candidates: Arc<[EndpointCandidate]>,
    pub active_index: usize,
    pub active: Arc<T>,
    pub is_healthy: bool,
    pub last_connected_at: SystemTime,
    pub reconnect_attempts: u32,
    /// Bumped whenever `active` changes, so faults from replaced handles are ignored.
    pub generation: u64,
}

impl<T> ConnectionState<T> {
    pub fn active_candidate(&self) -> &EndpointCandidate {
        &self.candidates[self.active_index]
    }
}

/// Last observed health outcome of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecord {
    pub healthy: bool,
    /// Unix timestamp of the check in milliseconds.
    pub last_check: u64,
    pub block_number: Option<u64>,
    pub chain_id: Option<ChainId>,
    pub error: Option<String>,
}

impl HealthRecord {
    pub fn passed(report: ProbeReport) -> Self {
        Self {
            healthy: true,
            last_check: unix_millis(SystemTime::now()),
            block_number: Some(report.block_number),
            chain_id: Some(report.chain_id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            last_check: unix_millis(SystemTime::now()),
            block_number: None,
            chain_id: None,
            error: Some(error.into()),
        }
    }
}

/// Snapshot of one network for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStatus {
    pub name: String,
    pub chain_id: ChainId,
    pub healthy: bool,
    pub active_index: usize,
    pub active_url: String,
    pub active_source: EndpointSource,
    pub candidates: Vec<String>,
    /// Unix timestamp of the last successful connection or check, in milliseconds.
    pub last_connected_at: u64,
    pub reconnect_attempts: u32,
    pub health: HealthRecord,
}

/// Snapshot of every tracked network, keyed by name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionStatus {
    pub networks: BTreeMap<String, NetworkStatus>,
}

impl ConnectionStatus {
    pub fn healthy_count(&self) -> usize {
        self.networks.values().filter(|n| n.healthy).count()
    }
}

/// Everything the manager tracks for one network.
pub(crate) struct NetworkSlot<T> {
    pub name: String,
    /// Configuration the network was initialized with; reconnection rebuilds from it.
    pub config: NetworkConfig,
    pub state: RwLock<ConnectionState<T>>,
    pub health: RwLock<HealthRecord>,
    /// Serializes failover, reconnection and health updates.
    pub writer: tokio::sync::Mutex<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
    recovery: Mutex<Option<JoinHandle<()>>>,
}

impl<T> NetworkSlot<T> {
    pub fn new(
        config: NetworkConfig,
        candidates: Vec<EndpointCandidate>,
        index: usize,
        transport: Arc<T>,
        report: ProbeReport,
    ) -> Self {
        Self {
            name: config.name.clone(),
            config,
            state: RwLock::new(ConnectionState {
                candidates: candidates.into(),
                active_index: index,
                active: transport,
                is_healthy: true,
                last_connected_at: SystemTime::now(),
                reconnect_attempts: 0,
                generation: 0,
            }),
            health: RwLock::new(HealthRecord::passed(report)),
            writer: tokio::sync::Mutex::new(()),
            listener: Mutex::new(None),
            recovery: Mutex::new(None),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId(self.config.chain_id)
    }

    pub fn is_healthy(&self) -> bool {
        self.state.read().is_healthy
    }

    /// Active transport, its candidate and the current generation.
    pub fn active_endpoint(&self) -> (Arc<T>, EndpointCandidate, u64) {
        let state = self.state.read();
        (state.active.clone(), state.active_candidate().clone(), state.generation)
    }

    /// Replace the whole candidate list and active endpoint (full reconnection).
    pub fn replace_connection(
        &self,
        candidates: Vec<EndpointCandidate>,
        index: usize,
        transport: Arc<T>,
        report: ProbeReport,
    ) -> u64 {
        let generation = {
            let mut state = self.state.write();
            state.candidates = candidates.into();
            Self::connect(&mut state, index, transport)
        };
        *self.health.write() = HealthRecord::passed(report);
        generation
    }

    /// Switch to another endpoint of the existing candidate list (failover).
    pub fn switch_endpoint(&self, index: usize, transport: Arc<T>, report: ProbeReport) -> u64 {
        let generation = Self::connect(&mut self.state.write(), index, transport);
        *self.health.write() = HealthRecord::passed(report);
        generation
    }

    fn connect(state: &mut ConnectionState<T>, index: usize, transport: Arc<T>) -> u64 {
        state.active_index = index;
        state.active = transport;
        state.is_healthy = true;
        state.last_connected_at = SystemTime::now();
        state.reconnect_attempts = 0;
        state.generation += 1;
        state.generation
    }

    /// Record a passing health check of the active endpoint.
    pub fn record_check_passed(&self, report: ProbeReport) {
        {
            let mut state = self.state.write();
            state.is_healthy = true;
            state.last_connected_at = SystemTime::now();
        }
        *self.health.write() = HealthRecord::passed(report);
    }

    pub fn mark_unhealthy(&self, error: impl Into<String>) {
        self.state.write().is_healthy = false;
        *self.health.write() = HealthRecord::failed(error);
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.state.read().reconnect_attempts
    }

    pub fn status(&self) -> NetworkStatus {
        let state = self.state.read();
        let active = state.active_candidate();
        NetworkStatus {
            name: self.name.clone(),
            chain_id: self.chain_id(),
            healthy: state.is_healthy,
            active_index: state.active_index,
            active_url: active.url.to_string(),
            active_source: active.source,
            candidates: state.candidates.iter().map(|c| c.url.to_string()).collect(),
            last_connected_at: unix_millis(state.last_connected_at),
            reconnect_attempts: state.reconnect_attempts,
            health: self.health.read().clone(),
        }
    }

    // --- Background tasks ---

    /// Install the fault listener of the active handle, aborting the previous one.
    pub fn set_listener(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.listener.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn recovery_in_flight(&self) -> bool {
        self.recovery
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start a recovery task unless one is already running.
    pub fn try_start_recovery<F>(&self, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let mut recovery = self.recovery.lock();
        if recovery.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }
        *recovery = Some(spawn());
        true
    }

    /// Install `handle` as the recovery task, aborting any task it replaces.
    pub fn replace_recovery(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.recovery.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn cancel_recovery(&self) {
        if let Some(task) = self.recovery.lock().take() {
            task.abort();
        }
    }

    /// Abort every task bound to this network.
    pub fn detach(&self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        self.cancel_recovery();
    }
}
