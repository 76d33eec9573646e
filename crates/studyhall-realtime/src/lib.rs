//! Thin realtime client over the Phoenix Channels v1 protocol.
//!
//! Provides a generic, reusable WebSocket client for the hosted backend's
//! realtime service using `tokio-tungstenite`. Handles heartbeats, channel
//! join/leave, broadcast, presence tracking, row-change routing, and
//! auto-reconnect with backoff.

mod client;
mod connection;
mod handler;
mod types;

pub use client::RealtimeClient;
pub use types::{
    BroadcastConfig, ChangeKind, ChannelConfig, PhoenixMessage, PostgresChangesConfig,
    PresenceKeyConfig, RealtimeCommand, RealtimeConfig, RealtimeEvent,
};
