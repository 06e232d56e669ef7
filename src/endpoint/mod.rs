//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig + public fallback table
//!     → candidate.rs (ordered EndpointCandidate list)
//!     → probe.rs (open + chain id / block number check under a deadline)
//!     → first passing candidate becomes the network's active handle
//! ```

pub mod candidate;
pub mod fallbacks;
pub mod probe;

pub use candidate::{build_candidates, EndpointCandidate, EndpointSource};
pub use fallbacks::PublicFallbacks;
pub use probe::{probe, validate, ProbeReport, ProbedEndpoint};
