//! Multi-chain RPC connection manager.
//!
//! Keeps one live, chain-id-verified RPC connection per configured network,
//! fails over across primary, backup and public endpoints, re-validates
//! connections on a timer and reconnects with a bounded retry budget.

// Core subsystems
pub mod blockchain;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod events;

// Background work
pub mod health;
pub mod lifecycle;

// Cross-cutting concerns
pub mod admin;
pub mod observability;

pub use blockchain::{AlloyConnector, AlloyTransport, ChainId, Connector, RpcTransport, TransportFault};
pub use config::{ManagerConfig, NetworkConfig};
pub use connection::{ConnectionError, ConnectionManager, ConnectionStatus, NetworkStatus, ReconnectOutcome};
pub use events::{ConnectionEvent, EventBus};
pub use lifecycle::Shutdown;
