//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs):
//!     → validate each network's active handle (chain id + block number)
//!     → pass: mark healthy
//!     → fail: mark unhealthy → schedule reconnection
//! ```
//!
//! # Design Decisions
//! - The check reuses the active handle; it never opens a new connection
//! - A network with recovery in flight is skipped for that tick
//! - A pass does not reset the reconnection counter; only a new connection does

pub mod active;

pub use active::HealthMonitor;
