//! Configuration, protocol types, and event/command enums for the realtime client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to the backend realtime service.
#[derive(Clone)]
pub struct RealtimeConfig {
    /// Backend project reference (e.g., "ojmqzagktzkualzgpcbq").
    pub project_ref: String,
    /// Publishable anon key.
    pub api_key: String,
    /// Optional access token (JWT) for authenticated connections.
    pub access_token: Option<String>,
    /// Heartbeat interval in seconds (default: 25).
    pub heartbeat_interval_secs: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay_secs: u64,
    /// Capacity of the event channel between the connection task and the
    /// consumer.
    pub event_buffer: usize,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("project_ref", &self.project_ref)
            .field("api_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("reconnect_delay_secs", &self.reconnect_delay_secs)
            .field("max_reconnect_delay_secs", &self.max_reconnect_delay_secs)
            .field("event_buffer", &self.event_buffer)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            project_ref: String::new(),
            api_key: String::new(),
            access_token: None,
            heartbeat_interval_secs: 25,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
            event_buffer: 256,
        }
    }
}

impl RealtimeConfig {
    /// Build the WebSocket URL for the realtime service.
    pub(crate) fn ws_url(&self) -> String {
        format!(
            "wss://{}.supabase.co/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.project_ref, self.api_key
        )
    }
}

// ---------------------------------------------------------------------------
// Phoenix Protocol Types
// ---------------------------------------------------------------------------

/// A Phoenix protocol message envelope (v1 JSON format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub msg_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Channel Configuration
// ---------------------------------------------------------------------------

/// Configuration for a realtime channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    pub broadcast: BroadcastConfig,
    pub presence: PresenceKeyConfig,
    /// Row-change subscriptions scoped to this channel. Empty for pure
    /// presence/broadcast channels.
    pub postgres_changes: Vec<PostgresChangesConfig>,
}

/// Broadcast configuration for a channel.
#[derive(Debug, Clone, Default)]
pub struct BroadcastConfig {
    /// Whether to receive your own broadcasts ("self" key on the wire).
    pub self_send: bool,
    /// Whether broadcasts are acknowledged by the server.
    pub ack: bool,
}

/// Presence configuration for a channel.
#[derive(Debug, Clone, Default)]
pub struct PresenceKeyConfig {
    /// The key used to identify this client in presence state.
    pub key: String,
}

/// One row-change subscription entry in a channel's join config.
#[derive(Debug, Clone, Serialize)]
pub struct PostgresChangesConfig {
    /// Event selector: `*`, `INSERT`, `UPDATE`, or `DELETE`.
    pub event: String,
    pub schema: String,
    pub table: String,
    /// Equality filter expression, e.g. `user_id=eq.u1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl PostgresChangesConfig {
    /// Subscribe to all change kinds on a table in the `public` schema.
    pub fn all(table: impl Into<String>, filter: Option<String>) -> Self {
        Self {
            event: "*".into(),
            schema: "public".into(),
            table: table.into(),
            filter,
        }
    }
}

impl ChannelConfig {
    /// Serialize to the JSON payload expected by the service's phx_join.
    pub(crate) fn to_join_payload(&self) -> serde_json::Value {
        let mut config = serde_json::json!({
            "broadcast": {
                "self": self.broadcast.self_send,
                "ack": self.broadcast.ack
            },
            "presence": {
                "key": self.presence.key
            }
        });
        if !self.postgres_changes.is_empty() {
            config["postgres_changes"] = serde_json::json!(self.postgres_changes);
        }
        serde_json::json!({ "config": config })
    }
}

// ---------------------------------------------------------------------------
// Row changes
// ---------------------------------------------------------------------------

/// Kind of a row-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }

    pub(crate) fn from_wire(s: &str) -> Option<Self> {
        match s {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Events emitted by the realtime client.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// WebSocket connection established.
    Connected,
    /// WebSocket connection lost.
    Disconnected,
    /// Successfully joined a channel.
    ChannelJoined { topic: String },
    /// Channel closed or errored.
    ChannelError { topic: String, message: String },
    /// A broadcast event received on a channel.
    Broadcast {
        topic: String,
        event: String,
        payload: serde_json::Value,
    },
    /// Full presence state snapshot (received after joining).
    PresenceState {
        topic: String,
        state: HashMap<String, Vec<serde_json::Value>>,
    },
    /// Incremental presence changes.
    PresenceDiff {
        topic: String,
        joins: HashMap<String, Vec<serde_json::Value>>,
        leaves: HashMap<String, Vec<serde_json::Value>>,
    },
    /// A row-change notification routed to a channel.
    PostgresChange {
        topic: String,
        kind: ChangeKind,
        record: Option<serde_json::Value>,
        old_record: Option<serde_json::Value>,
    },
    /// Error.
    Error(String),
}

/// Commands sent to the realtime connection from the application layer.
///
/// Public so an in-process fake (tests, instrumentation) can stand in for
/// the network connection by draining the command receiver returned by
/// [`RealtimeClient::detached`](crate::RealtimeClient::detached).
#[derive(Debug)]
pub enum RealtimeCommand {
    JoinChannel {
        topic: String,
        config: ChannelConfig,
    },
    LeaveChannel {
        topic: String,
    },
    Broadcast {
        topic: String,
        event: String,
        payload: serde_json::Value,
    },
    PresenceTrack {
        topic: String,
        payload: serde_json::Value,
    },
    PresenceUntrack {
        topic: String,
    },
    Disconnect,
}
