//! Configuration schema types for the Studyhall client.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults matching current behavior.

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the Studyhall client.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyhallConfig {
    pub backend: BackendConfig,
    pub realtime: RealtimeSettings,
    pub presence: PresenceSettings,
    pub logging: LoggingConfig,
}

/// Coordinates of the hosted backend project.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project reference (e.g., "ojmqzagktzkualzgpcbq").
    pub project_ref: String,
    /// Publishable anon key.
    pub api_key: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("project_ref", &self.project_ref)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Transport tuning for the realtime connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay: u64,
    /// Capacity of the per-connection event channel.
    pub event_buffer: u32,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: 25,
            reconnect_delay: 1,
            max_reconnect_delay: 30,
            event_buffer: 256,
        }
    }
}

/// Presence defaults for study rooms and live classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    pub enabled: bool,
    /// Prefix for study-room channel names (`<prefix>:<room>`).
    pub room_prefix: String,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            room_prefix: "study-room".into(),
        }
    }
}

/// Log level for the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by tracing's env filter.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub redact_secrets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            redact_secrets: true,
        }
    }
}
