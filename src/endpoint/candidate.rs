//! Endpoint candidate list construction.
//!
//! # Responsibilities
//! - Turn a network's configuration into an ordered list of endpoints
//! - Append the public fallbacks known for the network's chain
//!
//! # Design Decisions
//! - Order is fixed: primary, backups as listed, public fallbacks as listed
//! - No network calls happen here
//! - Malformed URLs are skipped with a warning, duplicates keep their first slot

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use crate::blockchain::types::ChainId;
use crate::config::schema::NetworkConfig;
use crate::connection::errors::{ConnectionError, ConnectionResult};
use crate::endpoint::fallbacks::PublicFallbacks;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSource {
    Primary,
    Backup,
    PublicFallback,
}

/// One endpoint a network may connect through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    /// Position in the network's candidate list.
    pub index: usize,
    pub url: Url,
    /// Chain id this endpoint must report.
    pub chain_id: ChainId,
    pub source: EndpointSource,
}

/// Build the ordered candidate list for a network.
///
/// # Errors
/// Returns [`ConnectionError::Configuration`] if no usable endpoint remains.
pub fn build_candidates(
    config: &NetworkConfig,
    fallbacks: &PublicFallbacks,
) -> ConnectionResult<Vec<EndpointCandidate>> {
    let chain_id = ChainId(config.chain_id);

    let primary = Some(config.rpc_url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| (url, EndpointSource::Primary));
    let backups = config
        .backup_rpc_urls
        .iter()
        .map(|url| (url.trim(), EndpointSource::Backup));
    let public = fallbacks
        .urls_for(chain_id)
        .iter()
        .map(|url| (url.trim(), EndpointSource::PublicFallback));

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for (raw, source) in primary.into_iter().chain(backups).chain(public) {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(network = %config.name, url = %raw, error = %e, "Ignoring invalid RPC URL");
                continue;
            }
        };
        if !seen.insert(url.clone()) {
            tracing::debug!(network = %config.name, url = %url, "Skipping duplicate RPC URL");
            continue;
        }
        candidates.push(EndpointCandidate {
            index: candidates.len(),
            url,
            chain_id,
            source,
        });
    }

    if candidates.is_empty() {
        return Err(ConnectionError::Configuration {
            network: config.name.clone(),
        });
    }

    tracing::debug!(
        network = %config.name,
        chain_id = %chain_id,
        candidates = candidates.len(),
        "Built endpoint candidate list"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(candidates: &[EndpointCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_order_primary_backups_fallbacks() {
        let config = NetworkConfig::new("bsc", 56, "http://bad1/")
            .with_backups(["http://bad2/", "http://good/"]);
        let fallbacks = PublicFallbacks::empty().with(ChainId(56), vec!["http://also-good/".into()]);

        let candidates = build_candidates(&config, &fallbacks).unwrap();
        assert_eq!(
            urls(&candidates),
            ["http://bad1/", "http://bad2/", "http://good/", "http://also-good/"]
        );
        assert_eq!(candidates[0].source, EndpointSource::Primary);
        assert_eq!(candidates[2].source, EndpointSource::Backup);
        assert_eq!(candidates[3].source, EndpointSource::PublicFallback);
        assert!(candidates.iter().enumerate().all(|(i, c)| c.index == i));
        assert!(candidates.iter().all(|c| c.chain_id == ChainId(56)));
    }

    #[test]
    fn test_fallbacks_only_for_matching_chain() {
        let config = NetworkConfig::new("polygon", 137, "http://primary/");
        let fallbacks = PublicFallbacks::empty().with(ChainId(56), vec!["http://bsc/".into()]);

        let candidates = build_candidates(&config, &fallbacks).unwrap();
        assert_eq!(urls(&candidates), ["http://primary/"]);
    }

    #[test]
    fn test_missing_primary_uses_fallbacks() {
        let config = NetworkConfig::new("polygon", 137, "  ");
        let fallbacks = PublicFallbacks::empty().with(ChainId(137), vec!["http://public/".into()]);

        let candidates = build_candidates(&config, &fallbacks).unwrap();
        assert_eq!(urls(&candidates), ["http://public/"]);
        assert_eq!(candidates[0].source, EndpointSource::PublicFallback);
    }

    #[test]
    fn test_no_endpoint_is_configuration_error() {
        let config = NetworkConfig::new("devnet", 31337, "");
        let err = build_candidates(&config, &PublicFallbacks::builtin()).unwrap_err();
        assert!(matches!(err, ConnectionError::Configuration { network } if network == "devnet"));
    }

    #[test]
    fn test_invalid_and_duplicate_urls_skipped() {
        let config = NetworkConfig::new("polygon", 137, "http://a/")
            .with_backups(["not a url", "http://a/", "http://b/"]);

        let candidates = build_candidates(&config, &PublicFallbacks::empty()).unwrap();
        assert_eq!(urls(&candidates), ["http://a/", "http://b/"]);
        assert_eq!(candidates[1].index, 1);
    }
}
