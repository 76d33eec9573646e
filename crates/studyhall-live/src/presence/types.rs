//! Configuration and callback types for the presence session.

use std::collections::HashMap;

/// Full membership snapshot: participant key to that participant's
/// currently-tracked payloads. A participant with several concurrent
/// connections has several entries; all of them are preserved.
pub type PresenceSnapshot = HashMap<String, Vec<serde_json::Value>>;

/// Invoked with the consolidated membership snapshot on every change.
pub type SyncCallback = Box<dyn Fn(PresenceSnapshot) + Send + Sync>;

/// Invoked with a participant key and their *first* payload on a join or
/// leave. When the service reports several simultaneous payloads for one
/// key, only the first is surfaced here; the full list still lands in the
/// next sync snapshot.
pub type MemberCallback = Box<dyn Fn(&str, serde_json::Value) + Send + Sync>;

/// Invoked with the event name and payload of a received broadcast.
pub type BroadcastCallback = Box<dyn Fn(&str, serde_json::Value) + Send + Sync>;

/// Configuration for a presence session.
#[derive(Debug, Clone)]
pub struct PresenceSessionConfig {
    /// Channel name. Must be non-empty.
    pub channel: String,
    /// Payload published for this client once the channel is established.
    pub initial_payload: serde_json::Map<String, serde_json::Value>,
}

impl PresenceSessionConfig {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            initial_payload: serde_json::Map::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.initial_payload.insert(key.into(), value);
        self
    }
}

/// Callbacks for presence and broadcast events.
#[derive(Default)]
pub struct PresenceCallbacks {
    pub on_sync: Option<SyncCallback>,
    pub on_join: Option<MemberCallback>,
    pub on_leave: Option<MemberCallback>,
    pub on_broadcast: Option<BroadcastCallback>,
}

impl PresenceCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_sync(mut self, f: impl Fn(PresenceSnapshot) + Send + Sync + 'static) -> Self {
        self.on_sync = Some(Box::new(f));
        self
    }

    pub fn on_join(
        mut self,
        f: impl Fn(&str, serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_join = Some(Box::new(f));
        self
    }

    pub fn on_leave(
        mut self,
        f: impl Fn(&str, serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    pub fn on_broadcast(
        mut self,
        f: impl Fn(&str, serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_broadcast = Some(Box::new(f));
        self
    }
}
