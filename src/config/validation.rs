//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, chain ids non-zero)
//! - Reject duplicate network names and malformed URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - A network without any endpoint is NOT rejected here; whether the public
//!   fallback table covers it is decided when candidates are built

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ManagerConfig, NetworkConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("network name must not be empty")]
    EmptyNetworkName,

    #[error("network '{0}' is defined more than once")]
    DuplicateNetwork(String),

    #[error("network '{0}' has chain_id 0")]
    ZeroChainId(String),

    #[error("network '{network}' has invalid RPC URL '{url}'")]
    InvalidUrl { network: String, url: String },

    #[error("public fallback for chain {chain_id} has invalid URL '{url}'")]
    InvalidFallbackUrl { chain_id: u64, url: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let connection = &config.connection;
    if connection.health_check_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("connection.health_check_interval_secs"));
    }
    if connection.probe_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("connection.probe_timeout_secs"));
    }
    if connection.event_buffer == 0 {
        errors.push(ValidationError::ZeroValue("connection.event_buffer"));
    }

    let mut seen = HashSet::new();
    for network in &config.networks {
        validate_network(network, &mut errors);
        if !network.name.is_empty() && !seen.insert(network.name.as_str()) {
            errors.push(ValidationError::DuplicateNetwork(network.name.clone()));
        }
    }

    for fallback in &config.public_fallbacks {
        for url in &fallback.urls {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::InvalidFallbackUrl {
                    chain_id: fallback.chain_id,
                    url: url.clone(),
                });
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(network: &NetworkConfig, errors: &mut Vec<ValidationError>) {
    if network.name.trim().is_empty() {
        errors.push(ValidationError::EmptyNetworkName);
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::ZeroChainId(network.name.clone()));
    }

    let primary = Some(network.rpc_url.as_str()).filter(|url| !url.trim().is_empty());
    for url in primary.into_iter().chain(network.backup_rpc_urls.iter().map(String::as_str)) {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::InvalidUrl {
                network: network.name.clone(),
                url: url.to_string(),
            });
        }
    }
}
