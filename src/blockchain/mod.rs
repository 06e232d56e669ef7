//! Blockchain RPC transport subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint URL
//!     → transport.rs (Connector opens an RpcTransport)
//!     → client.rs (alloy provider behind the transport)
//!     → probe / health checks query chain id + block number
//!     → callers receive the handle and report runtime faults on it
//! ```
//!
//! # Design Decisions
//! - The manager is generic over `Connector`, alloy is the default backend
//! - Transports never retry or fail over on their own
//! - Faults are broadcast so stale listeners cannot block the sender

pub mod client;
pub mod transport;
pub mod types;

pub use client::{AlloyConnector, AlloyTransport};
pub use transport::{Connector, RpcTransport};
pub use types::{ChainId, TransportFault};
