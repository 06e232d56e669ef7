//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_probe_total` (counter): endpoint probes by network, outcome
//! - `rpc_network_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `rpc_active_endpoint_index` (gauge): position of the active endpoint
//! - `rpc_failover_total` (counter): failovers by network, result
//! - `rpc_reconnect_total` (counter): reconnection cycles by network, result
//!
//! Without an installed exporter every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(network: &str, outcome: &'static str) {
    counter!("rpc_probe_total", "network" => network.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_network_health(network: &str, healthy: bool) {
    gauge!("rpc_network_healthy", "network" => network.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_active_endpoint(network: &str, index: usize) {
    gauge!("rpc_active_endpoint_index", "network" => network.to_string()).set(index as f64);
}

pub fn record_failover(network: &str, success: bool) {
    let result = if success { "success" } else { "failed" };
    counter!("rpc_failover_total", "network" => network.to_string(), "result" => result).increment(1);
}

pub fn record_reconnect(network: &str, result: &'static str) {
    counter!("rpc_reconnect_total", "network" => network.to_string(), "result" => result).increment(1);
}
