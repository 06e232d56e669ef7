//! Connection management subsystem.
//!
//! # Data Flow
//! ```text
//! initialize_connection(config)
//!     → endpoint candidates → probe in order → state.rs (NetworkSlot)
//!
//! Transport fault on active handle:
//!     → failover.rs (walk remaining candidates from active+1)
//!
//! Health check failure (health/):
//!     → reconnect.rs (delay → rebuild → probe, else failover)
//!
//! Callers:
//!     get_provider / is_network_healthy / get_connection_status
//! ```
//!
//! # Design Decisions
//! - One keyed store of per-network records, each with its own writer lock
//! - At most one recovery task per network
//! - Readers never wait on a probe in progress

pub mod errors;
pub mod failover;
pub mod manager;
pub mod reconnect;
pub mod state;

pub use errors::{ConnectionError, ConnectionResult, ProbeError};
pub use manager::ConnectionManager;
pub use reconnect::ReconnectOutcome;
pub use state::{ConnectionStatus, HealthRecord, NetworkStatus};
