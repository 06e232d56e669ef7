//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize every configured network
//! - Report which networks came up
//!
//! # Design Decisions
//! - Networks initialize concurrently; one slow chain does not delay the rest
//! - A network that fails to connect is logged and skipped, the rest keep running

use futures_util::future::join_all;

use crate::blockchain::transport::Connector;
use crate::config::NetworkConfig;
use crate::connection::{ConnectionManager, ConnectionResult};

/// Initialize all `networks`, returning each network's outcome in input order.
pub async fn initialize_networks<C: Connector>(
    manager: &ConnectionManager<C>,
    networks: &[NetworkConfig],
) -> Vec<(String, ConnectionResult<()>)> {
    let outcomes = join_all(networks.iter().map(|network| async move {
        let result = manager.initialize_connection(network.clone()).await;
        (network.name.clone(), result)
    }))
    .await;

    let connected = outcomes.iter().filter(|(_, result)| result.is_ok()).count();
    for (name, result) in &outcomes {
        if let Err(e) = result {
            tracing::error!(network = %name, error = %e, "Network failed to initialize");
        }
    }
    if connected == networks.len() {
        tracing::info!(networks = connected, "All networks connected");
    } else {
        tracing::warn!(
            connected,
            failed = networks.len() - connected,
            "Started with some networks unavailable"
        );
    }

    outcomes
}
