//! Connection event subsystem.
//!
//! # Data Flow
//! ```text
//! initialize / failover / reconnect outcome
//!     → bus.rs (broadcast ConnectionEvent)
//!     → subscribers: bootstrap logger, metrics, application code
//! ```
//!
//! # Design Decisions
//! - Events describe transitions only; current state is read from the manager
//! - Runtime failures after startup are reported here, never returned as errors

pub mod bus;

pub use bus::{ConnectionEvent, EventBus};
