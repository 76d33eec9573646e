//! Public handle for interacting with the realtime connection.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::connection::connection_loop;
use crate::types::{ChannelConfig, RealtimeCommand, RealtimeConfig, RealtimeEvent};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle for interacting with the realtime connection.
///
/// All methods are non-blocking and send commands to the background
/// connection task.
#[derive(Debug)]
pub struct RealtimeClient {
    command_tx: mpsc::Sender<RealtimeCommand>,
    connected: Arc<RwLock<bool>>,
}

impl RealtimeClient {
    /// Create a new client and start the background connection.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: RealtimeConfig) -> (Self, mpsc::Receiver<RealtimeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (command_tx, command_rx) = mpsc::channel(64);
        let connected = Arc::new(RwLock::new(false));

        let client = Self {
            command_tx,
            connected: Arc::clone(&connected),
        };

        tokio::spawn(connection_loop(config, connected, event_tx, command_rx));

        (client, event_rx)
    }

    /// Create a handle with no network connection behind it.
    ///
    /// Returns the command receiver so an in-process fake can stand in for
    /// the connection task: the fake drains commands and feeds whatever
    /// `RealtimeEvent`s it likes into the event channel it owns.
    pub fn detached(capacity: usize) -> (Self, mpsc::Receiver<RealtimeCommand>) {
        let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
        let client = Self {
            command_tx,
            connected: Arc::new(RwLock::new(false)),
        };
        (client, command_rx)
    }

    /// Clone the command sender to create a lightweight handle
    /// that can send commands to the same connection.
    pub fn clone_sender(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            connected: Arc::clone(&self.connected),
        }
    }

    /// Join a realtime channel.
    pub async fn join_channel(&self, topic: &str, config: ChannelConfig) {
        let _ = self
            .command_tx
            .send(RealtimeCommand::JoinChannel {
                topic: topic.to_string(),
                config,
            })
            .await;
    }

    /// Leave a channel.
    pub async fn leave_channel(&self, topic: &str) {
        let _ = self
            .command_tx
            .send(RealtimeCommand::LeaveChannel {
                topic: topic.to_string(),
            })
            .await;
    }

    /// Send a broadcast event on a channel.
    pub async fn broadcast(&self, topic: &str, event: &str, payload: serde_json::Value) {
        let _ = self
            .command_tx
            .send(RealtimeCommand::Broadcast {
                topic: topic.to_string(),
                event: event.to_string(),
                payload,
            })
            .await;
    }

    /// Track presence on a channel.
    pub async fn presence_track(&self, topic: &str, payload: serde_json::Value) {
        let _ = self
            .command_tx
            .send(RealtimeCommand::PresenceTrack {
                topic: topic.to_string(),
                payload,
            })
            .await;
    }

    /// Untrack presence on a channel.
    pub async fn presence_untrack(&self, topic: &str) {
        let _ = self
            .command_tx
            .send(RealtimeCommand::PresenceUntrack {
                topic: topic.to_string(),
            })
            .await;
    }

    /// Check if the WebSocket connection is currently up.
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Disconnect from the server and stop the connection task.
    pub async fn disconnect(&self) {
        let _ = self.command_tx.send(RealtimeCommand::Disconnect).await;
    }

    /// Best-effort synchronous disconnect for use from `Drop` impls.
    pub fn disconnect_now(&self) {
        let _ = self.command_tx.try_send(RealtimeCommand::Disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PostgresChangesConfig, PresenceKeyConfig};

    #[tokio::test]
    async fn detached_client_forwards_commands() {
        let (client, mut command_rx) = RealtimeClient::detached(8);

        client
            .join_channel(
                "room-42",
                ChannelConfig {
                    presence: PresenceKeyConfig { key: "u1".into() },
                    ..Default::default()
                },
            )
            .await;
        client
            .broadcast("room-42", "hand_raise", serde_json::json!({"up": true}))
            .await;
        client.leave_channel("room-42").await;

        match command_rx.recv().await.unwrap() {
            RealtimeCommand::JoinChannel { topic, config } => {
                assert_eq!(topic, "room-42");
                assert_eq!(config.presence.key, "u1");
            }
            other => panic!("expected JoinChannel, got {other:?}"),
        }
        assert!(matches!(
            command_rx.recv().await.unwrap(),
            RealtimeCommand::Broadcast { ref event, .. } if event == "hand_raise"
        ));
        assert!(matches!(
            command_rx.recv().await.unwrap(),
            RealtimeCommand::LeaveChannel { ref topic } if topic == "room-42"
        ));
    }

    #[tokio::test]
    async fn clone_sender_shares_the_connection() {
        let (client, mut command_rx) = RealtimeClient::detached(8);
        let second = client.clone_sender();

        second.presence_untrack("room-42").await;

        assert!(matches!(
            command_rx.recv().await.unwrap(),
            RealtimeCommand::PresenceUntrack { ref topic } if topic == "room-42"
        ));
    }

    #[tokio::test]
    async fn detached_client_is_not_connected() {
        let (client, _command_rx) = RealtimeClient::detached(8);
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn join_carries_postgres_changes_config() {
        let (client, mut command_rx) = RealtimeClient::detached(8);

        client
            .join_channel(
                "orders-changes-abc123",
                ChannelConfig {
                    postgres_changes: vec![PostgresChangesConfig::all(
                        "orders",
                        Some("user_id=eq.u1".into()),
                    )],
                    ..Default::default()
                },
            )
            .await;

        match command_rx.recv().await.unwrap() {
            RealtimeCommand::JoinChannel { config, .. } => {
                assert_eq!(config.postgres_changes.len(), 1);
                assert_eq!(config.postgres_changes[0].table, "orders");
                assert_eq!(
                    config.postgres_changes[0].filter.as_deref(),
                    Some("user_id=eq.u1")
                );
            }
            other => panic!("expected JoinChannel, got {other:?}"),
        }
    }
}
