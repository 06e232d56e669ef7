//! Static public RPC endpoints keyed by chain id.
//!
//! These are tried after a network's own primary and backup endpoints. The
//! built-in table can be replaced per chain from configuration.

use std::collections::HashMap;

use crate::blockchain::types::ChainId;
use crate::config::schema::PublicFallbackConfig;

const BUILTIN: &[(u64, &[&str])] = &[
    (
        1,
        &[
            "https://eth.llamarpc.com",
            "https://rpc.ankr.com/eth",
            "https://ethereum.publicnode.com",
        ],
    ),
    (
        10,
        &["https://mainnet.optimism.io", "https://optimism.publicnode.com"],
    ),
    (
        56,
        &[
            "https://bsc-dataseed.binance.org",
            "https://bsc-dataseed1.defibit.io",
            "https://bsc.publicnode.com",
        ],
    ),
    (
        137,
        &[
            "https://polygon-rpc.com",
            "https://polygon-bor.publicnode.com",
        ],
    ),
    (8453, &["https://mainnet.base.org", "https://base.publicnode.com"]),
    (
        42161,
        &["https://arb1.arbitrum.io/rpc", "https://arbitrum-one.publicnode.com"],
    ),
    (
        43114,
        &[
            "https://api.avax.network/ext/bc/C/rpc",
            "https://avalanche-c-chain.publicnode.com",
        ],
    ),
    (
        11155111,
        &["https://rpc.sepolia.org", "https://ethereum-sepolia.publicnode.com"],
    ),
];

/// Public fallback URLs per chain.
#[derive(Debug, Clone, Default)]
pub struct PublicFallbacks {
    table: HashMap<ChainId, Vec<String>>,
}

impl PublicFallbacks {
    /// An empty table: networks use only their own endpoints.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of well-known public endpoints.
    pub fn builtin() -> Self {
        let table = BUILTIN
            .iter()
            .map(|(chain, urls)| (ChainId(*chain), urls.iter().map(|u| u.to_string()).collect()))
            .collect();
        Self { table }
    }

    /// Build the table from configuration.
    ///
    /// Each configured entry replaces the built-in list for its chain.
    pub fn from_config(use_builtin: bool, overrides: &[PublicFallbackConfig]) -> Self {
        let mut fallbacks = if use_builtin {
            Self::builtin()
        } else {
            Self::empty()
        };
        for entry in overrides {
            fallbacks.set(ChainId(entry.chain_id), entry.urls.clone());
        }
        fallbacks
    }

    /// Replace the fallback list for one chain.
    pub fn set(&mut self, chain_id: ChainId, urls: Vec<String>) {
        self.table.insert(chain_id, urls);
    }

    pub fn with(mut self, chain_id: ChainId, urls: Vec<String>) -> Self {
        self.set(chain_id, urls);
        self
    }

    /// Fallback URLs for a chain, empty if none are known.
    pub fn urls_for(&self, chain_id: ChainId) -> &[String] {
        self.table.get(&chain_id).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_major_chains() {
        let fallbacks = PublicFallbacks::builtin();
        for chain in [1, 56, 137, 42161] {
            assert!(!fallbacks.urls_for(ChainId(chain)).is_empty(), "chain {chain}");
        }
        assert!(fallbacks.urls_for(ChainId(31337)).is_empty());
    }

    #[test]
    fn test_override_replaces_builtin_entry() {
        let overrides = vec![PublicFallbackConfig {
            chain_id: 56,
            urls: vec!["https://bsc.internal.example".into()],
        }];
        let fallbacks = PublicFallbacks::from_config(true, &overrides);
        assert_eq!(fallbacks.urls_for(ChainId(56)), ["https://bsc.internal.example"]);
        assert!(!fallbacks.urls_for(ChainId(1)).is_empty());
    }

    #[test]
    fn test_without_builtin() {
        let fallbacks = PublicFallbacks::from_config(false, &[]);
        assert!(fallbacks.urls_for(ChainId(1)).is_empty());
    }
}
