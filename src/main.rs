//! RPC connection manager service.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml
//!       │
//!       ▼
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                    CONNECTION MANAGER                         │
//!   │                                                               │
//!   │  ┌──────────┐    ┌─────────┐    ┌──────────────────────┐      │
//!   │  │ endpoint │───▶│  probe  │───▶│ connection (per net) │      │
//!   │  │candidates│    │         │    │  active handle       │──────┼──▶ get_provider
//!   │  └──────────┘    └─────────┘    └─────────┬────────────┘      │
//!   │                                           │                   │
//!   │        transport fault ──▶ failover ◀─────┤                   │
//!   │        health tick ──▶ reconnect ─────────┘                   │
//!   │                                                               │
//!   │  events ──▶ log / subscribers      admin API ──▶ status       │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use rpc_manager::admin::admin_router;
use rpc_manager::config::{load_config, ManagerConfig};
use rpc_manager::connection::ConnectionManager;
use rpc_manager::lifecycle::{initialize_networks, signals, Shutdown};
use rpc_manager::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rpc-manager")]
#[command(about = "Multi-chain RPC connection manager", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        networks = config.networks.len(),
        "rpc-manager starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let manager = ConnectionManager::from_config(&config);
    let shutdown = Shutdown::new();
    let event_log = tokio::spawn(log_events(manager.clone(), shutdown.subscribe()));

    initialize_networks(&manager, &config.networks).await;
    manager.start_health_monitoring();

    let admin = if config.admin.enabled {
        Some(serve_admin(&config, manager.clone(), &shutdown).await?)
    } else {
        None
    };

    signals::wait_for_signal().await;

    shutdown.trigger();
    manager.shutdown();
    if let Some(admin) = admin {
        let _ = admin.await;
    }
    let _ = event_log.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn serve_admin(
    config: &ManagerConfig,
    manager: ConnectionManager,
    shutdown: &Shutdown,
) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    let router = admin_router(manager, &config.admin.api_key);
    let mut stop = shutdown.subscribe();
    Ok(tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Admin API stopped with error");
        }
    }))
}

/// Log every connection event until shutdown.
async fn log_events(manager: ConnectionManager, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
    let mut events = manager.subscribe();
    drop(manager);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => tracing::info!(
                    event = event.name(),
                    network = %event.network(),
                    details = %serde_json::to_string(&event).unwrap_or_default(),
                    "Connection event"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
