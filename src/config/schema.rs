//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the manager.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the connection manager.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Probe, health check and reconnection tuning.
    pub connection: ConnectionConfig,

    /// Networks to keep connected.
    pub networks: Vec<NetworkConfig>,

    /// Use the built-in public RPC table for chains that have an entry.
    pub builtin_public_fallbacks: bool,

    /// Public fallback overrides, one entry per chain id.
    pub public_fallbacks: Vec<PublicFallbackConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            networks: Vec::new(),
            builtin_public_fallbacks: true,
            public_fallbacks: Vec::new(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Connection management tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Interval between health sweeps in seconds.
    pub health_check_interval_secs: u64,

    /// Deadline for a single endpoint probe in seconds.
    pub probe_timeout_secs: u64,

    /// Fixed delay before each reconnection attempt in seconds.
    pub reconnect_delay_secs: u64,

    /// Reconnection attempts allowed before automatic recovery stops.
    pub max_reconnect_attempts: u32,

    /// Capacity of the event broadcast channel.
    pub event_buffer: usize,
}

impl ConnectionConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: 30,
            probe_timeout_secs: 10,
            reconnect_delay_secs: 5,
            max_reconnect_attempts: 5,
            event_buffer: 64,
        }
    }
}

/// A blockchain network to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Network name used as the lookup key (e.g., "polygon").
    pub name: String,

    /// Chain ID every endpoint must report.
    pub chain_id: u64,

    /// Primary JSON-RPC endpoint URL. Blank means no primary.
    #[serde(default)]
    pub rpc_url: String,

    /// Backup endpoints, tried in order after the primary.
    #[serde(default)]
    pub backup_rpc_urls: Vec<String>,
}

impl NetworkConfig {
    pub fn new(name: impl Into<String>, chain_id: u64, rpc_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            rpc_url: rpc_url.into(),
            backup_rpc_urls: Vec::new(),
        }
    }

    pub fn with_backups<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backup_rpc_urls = urls.into_iter().map(Into::into).collect();
        self
    }
}

/// Public fallback endpoints for one chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicFallbackConfig {
    pub chain_id: u64,
    pub urls: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert!(config.builtin_public_fallbacks);
        assert_eq!(config.connection.health_check_interval(), Duration::from_secs(30));
        assert_eq!(config.connection.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.connection.max_reconnect_attempts, 5);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_minimal_toml() {
        let config: ManagerConfig = toml::from_str(
            r#"
            [[networks]]
            name = "bsc"
            chain_id = 56
            rpc_url = "https://bsc.example.org"
            backup_rpc_urls = ["https://bsc-2.example.org"]

            [[networks]]
            name = "polygon"
            chain_id = 137

            [connection]
            max_reconnect_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.networks[0].backup_rpc_urls.len(), 1);
        assert!(config.networks[1].rpc_url.is_empty());
        assert_eq!(config.connection.max_reconnect_attempts, 3);
        assert_eq!(config.connection.probe_timeout_secs, 10);
    }
}
