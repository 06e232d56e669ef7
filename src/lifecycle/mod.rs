//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Initialize networks → Start health monitor → Admin API
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop health monitor → Detach listeners → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then networks, then background tasks
//! - Manager shutdown is idempotent and safe from any task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::initialize_networks;
