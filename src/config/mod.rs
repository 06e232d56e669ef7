//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ManagerConfig (validated, immutable)
//!     → NetworkConfig handed to the connection manager at bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; networks are supplied once at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AdminConfig;
pub use schema::ConnectionConfig;
pub use schema::ManagerConfig;
pub use schema::NetworkConfig;
pub use schema::ObservabilityConfig;
pub use schema::PublicFallbackConfig;
