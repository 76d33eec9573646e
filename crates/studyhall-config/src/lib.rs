//! Studyhall client configuration.
//!
//! TOML-based configuration for the realtime client: backend project
//! coordinates, transport tuning, and presence defaults. All sections use
//! sensible defaults so partial configs work out of the box.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config_path, load_default, load_from_path};
pub use schema::{
    BackendConfig, LogLevel, LoggingConfig, PresenceSettings, RealtimeSettings, StudyhallConfig,
    CONFIG_SCHEMA_VERSION,
};

use studyhall_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creating a default
/// file if none exists, and validates the result.
pub fn load_config() -> Result<StudyhallConfig, ConfigError> {
    loader::load_default()
}
