//! Connection and probe error definitions.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::blockchain::types::ChainId;

/// Why a single endpoint probe failed.
///
/// Probe errors never leave the manager on their own: they are logged and
/// the next candidate is tried. The last one is carried by
/// [`ConnectionError::AllProvidersFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The endpoint did not answer within the probe deadline.
    #[error("{url} did not respond within {timeout:?}")]
    Timeout { url: Url, timeout: Duration },

    /// The endpoint serves a different chain than configured.
    #[error("{url} reports chain id {actual}, expected {expected}")]
    ChainIdMismatch {
        url: Url,
        expected: ChainId,
        actual: ChainId,
    },

    /// The endpoint answered but reported block number 0.
    #[error("{url} reports block number 0")]
    InvalidBlockNumber { url: Url },

    /// Transport-level failure (connection refused, RPC error, bad response).
    #[error("{url} transport error: {reason}")]
    Transport { url: Url, reason: String },
}

impl ProbeError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::ChainIdMismatch { .. } => "chain_id_mismatch",
            ProbeError::InvalidBlockNumber { .. } => "invalid_block_number",
            ProbeError::Transport { .. } => "transport",
        }
    }
}

/// Errors surfaced to callers of the connection manager.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The network has no usable endpoint configured.
    #[error("network '{network}' has no usable RPC endpoint configured")]
    Configuration { network: String },

    /// Every candidate endpoint failed its probe.
    #[error("all {attempted} RPC endpoints failed for network '{network}': {last_error}")]
    AllProvidersFailed {
        network: String,
        attempted: usize,
        #[source]
        last_error: ProbeError,
    },

    /// The network was never connected, or has been shut down.
    #[error("network '{0}' is not connected")]
    NetworkNotConnected(String),

    /// The network is tracked but its active endpoint is failing.
    #[error("network '{0}' is unhealthy")]
    NetworkUnhealthy(String),
}

/// Result type for connection manager operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;
