//! TOML config file loading and creation.

use std::path::{Path, PathBuf};

use studyhall_common::ConfigError;
use tracing::{info, warn};

use crate::schema::StudyhallConfig;
use crate::validation;

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// After loading, the config is validated; if validation fails, a warning
/// is logged and the parsed config is returned as-is.
pub fn load_from_path(path: &Path) -> Result<StudyhallConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: StudyhallConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!(
            "config validation warning: {e} — using parsed config with potentially invalid values"
        );
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/studyhall/config.toml`
/// On Linux: `~/.config/studyhall/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<StudyhallConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::ParseError(msg)) if msg.contains("failed to read") => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(StudyhallConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("studyhall").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

/// Default TOML config content with inline documentation comments.
fn default_config_toml() -> &'static str {
    r#"# Studyhall Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[backend]
# Hosted backend project coordinates. Both fields are required for the
# client to connect.
project_ref = ""
api_key = ""

[realtime]
# heartbeat_interval = 25     # seconds, 5-300
# reconnect_delay = 1         # seconds, 1-60
# max_reconnect_delay = 30    # seconds, >= reconnect_delay
# event_buffer = 256          # 16-65536

[presence]
# enabled = true
# room_prefix = "study-room"

[logging]
# level = "INFO"              # TRACE | DEBUG | INFO | WARN | ERROR
# redact_secrets = true
"#
}
