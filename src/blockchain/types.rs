//! Chain-specific types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque transport-level failure.
///
/// Cloneable so the same fault can be fanned out to every listener of a
/// transport's notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportFault(pub String);

impl TransportFault {
    pub fn new(reason: impl std::fmt::Display) -> Self {
        Self(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(56u64);
        assert_eq!(chain_id.0, 56);
        assert_eq!(u64::from(chain_id), 56);
        assert_eq!(chain_id.to_string(), "56");
    }

    #[test]
    fn test_fault_display() {
        let fault = TransportFault::new("connection reset by peer");
        assert_eq!(fault.to_string(), "connection reset by peer");
    }
}
