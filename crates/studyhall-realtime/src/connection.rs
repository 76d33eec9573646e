//! Background WebSocket connection loop with auto-reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info, warn};

use crate::handler::handle_phoenix_message;
use crate::types::{ChannelConfig, PhoenixMessage, RealtimeCommand, RealtimeConfig, RealtimeEvent};

// ---------------------------------------------------------------------------
// Ref Counter
// ---------------------------------------------------------------------------

/// Monotonically increasing ref counter for Phoenix messages.
static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

/// State for channels that should be (re)joined on reconnect.
#[derive(Clone)]
pub(crate) struct PendingChannel {
    pub(crate) config: ChannelConfig,
    /// Last tracked presence payload, replayed after a rejoin so presence
    /// survives reconnects.
    pub(crate) presence_payload: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task managing the WebSocket connection with auto-reconnect.
///
/// Exits when a `Disconnect` command arrives or every client handle has
/// been dropped.
pub(crate) async fn connection_loop(
    config: RealtimeConfig,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<RealtimeEvent>,
    command_rx: mpsc::Receiver<RealtimeCommand>,
) {
    let command_rx = Arc::new(Mutex::new(command_rx));
    // Channels to rejoin on reconnect.
    let joined_channels: Arc<RwLock<HashMap<String, PendingChannel>>> =
        Arc::new(RwLock::new(HashMap::new()));
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut reconnect_delay = config.reconnect_delay_secs;

    loop {
        let url = config.ws_url();
        info!(url = %url.split('?').next().unwrap_or(""), "Connecting to realtime service");

        match tokio::time::timeout(
            Duration::from_secs(15),
            tokio_tungstenite::connect_async(&url),
        )
        .await
        {
            Ok(Ok((ws_stream, _))) => {
                reconnect_delay = config.reconnect_delay_secs;
                *connected.write().await = true;
                let _ = event_tx.send(RealtimeEvent::Connected).await;

                let (ws_write, ws_read) = ws_stream.split();
                let ws_write = Arc::new(Mutex::new(ws_write));

                // Rejoin previously-joined channels and replay their tracked
                // presence so membership survives the reconnect.
                {
                    let channels = joined_channels.read().await;
                    for (topic, pending) in channels.iter() {
                        send_phoenix(
                            &ws_write,
                            topic,
                            "phx_join",
                            pending.config.to_join_payload(),
                        )
                        .await;
                        if let Some(payload) = &pending.presence_payload {
                            send_phoenix(
                                &ws_write,
                                topic,
                                "presence",
                                serde_json::json!({
                                    "type": "presence",
                                    "event": "track",
                                    "payload": payload
                                }),
                            )
                            .await;
                        }
                    }
                }

                // Spawn heartbeat task.
                let heartbeat_handle = tokio::spawn(heartbeat_task(
                    Arc::clone(&ws_write),
                    config.heartbeat_interval_secs,
                ));

                // Spawn command forwarder.
                let cmd_handle = tokio::spawn(command_forwarder(
                    Arc::clone(&command_rx),
                    Arc::clone(&ws_write),
                    Arc::clone(&joined_channels),
                    Arc::clone(&shutdown),
                ));

                // Process incoming messages.
                let mut read_stream = ws_read;
                while let Some(msg_result) = read_stream.next().await {
                    match msg_result {
                        Ok(WsMessage::Text(text)) => {
                            if let Ok(phoenix_msg) = serde_json::from_str::<PhoenixMessage>(&text) {
                                handle_phoenix_message(&phoenix_msg, &event_tx).await;
                            } else {
                                tracing::debug!(text = %text, "Unrecognized message from realtime service");
                            }
                        }
                        Ok(WsMessage::Close(_)) => {
                            info!("Realtime service closed connection");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                        _ => {}
                    }
                }

                // Cleanup.
                heartbeat_handle.abort();
                cmd_handle.abort();
                *connected.write().await = false;
                let _ = event_tx.send(RealtimeEvent::Disconnected).await;
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to realtime service");
                let _ = event_tx
                    .send(RealtimeEvent::Error(format!("Connection failed: {e}")))
                    .await;
            }
            Err(_elapsed) => {
                error!("WebSocket connection timed out after 15s");
                let _ = event_tx
                    .send(RealtimeEvent::Error(
                        "Connection timed out after 15s".to_string(),
                    ))
                    .await;
            }
        }

        // A requested disconnect (or all handles dropped) ends the task
        // instead of reconnecting.
        if shutdown.load(Ordering::SeqCst) {
            info!("Realtime connection task stopped");
            return;
        }

        // Exponential backoff reconnect.
        info!(delay = reconnect_delay, "Reconnecting in {} seconds", reconnect_delay);
        tokio::time::sleep(Duration::from_secs(reconnect_delay)).await;
        reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay_secs);
    }
}

/// Serialize and send one Phoenix frame, prefixing the realtime topic.
async fn send_phoenix<S>(
    ws_write: &Arc<Mutex<S>>,
    topic: &str,
    event: &str,
    payload: serde_json::Value,
) where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let msg = PhoenixMessage {
        topic: format!("realtime:{topic}"),
        event: event.to_string(),
        payload,
        msg_ref: Some(next_ref()),
    };
    if let Ok(json) = serde_json::to_string(&msg) {
        let mut writer = ws_write.lock().await;
        let _ = writer.send(WsMessage::Text(json.into())).await;
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

async fn heartbeat_task<S>(ws_write: Arc<Mutex<S>>, interval_secs: u64)
where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        let msg = PhoenixMessage {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: serde_json::json!({}),
            msg_ref: Some(next_ref()),
        };
        if let Ok(json) = serde_json::to_string(&msg) {
            let mut writer = ws_write.lock().await;
            if writer.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command Forwarder
// ---------------------------------------------------------------------------

async fn command_forwarder<S>(
    cmd_rx: Arc<Mutex<mpsc::Receiver<RealtimeCommand>>>,
    cmd_write: Arc<Mutex<S>>,
    cmd_channels: Arc<RwLock<HashMap<String, PendingChannel>>>,
    shutdown: Arc<AtomicBool>,
) where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let mut rx = cmd_rx.lock().await;
    loop {
        let Some(cmd) = rx.recv().await else {
            // Every client handle is gone; close the socket and stop.
            shutdown.store(true, Ordering::SeqCst);
            let mut writer = cmd_write.lock().await;
            let _ = writer.send(WsMessage::Close(None)).await;
            return;
        };

        match cmd {
            RealtimeCommand::JoinChannel { topic, config } => {
                send_phoenix(&cmd_write, &topic, "phx_join", config.to_join_payload()).await;
                cmd_channels.write().await.insert(
                    topic,
                    PendingChannel {
                        config,
                        presence_payload: None,
                    },
                );
            }
            RealtimeCommand::LeaveChannel { topic } => {
                send_phoenix(&cmd_write, &topic, "phx_leave", serde_json::json!({})).await;
                cmd_channels.write().await.remove(&topic);
            }
            RealtimeCommand::Broadcast {
                topic,
                event,
                payload,
            } => {
                send_phoenix(
                    &cmd_write,
                    &topic,
                    "broadcast",
                    serde_json::json!({
                        "type": "broadcast",
                        "event": event,
                        "payload": payload
                    }),
                )
                .await;
            }
            RealtimeCommand::PresenceTrack { topic, payload } => {
                send_phoenix(
                    &cmd_write,
                    &topic,
                    "presence",
                    serde_json::json!({
                        "type": "presence",
                        "event": "track",
                        "payload": payload
                    }),
                )
                .await;
                // Store for re-tracking on reconnect.
                if let Some(ch) = cmd_channels.write().await.get_mut(&topic) {
                    ch.presence_payload = Some(payload);
                }
            }
            RealtimeCommand::PresenceUntrack { topic } => {
                send_phoenix(
                    &cmd_write,
                    &topic,
                    "presence",
                    serde_json::json!({
                        "type": "presence",
                        "event": "untrack"
                    }),
                )
                .await;
                if let Some(ch) = cmd_channels.write().await.get_mut(&topic) {
                    ch.presence_payload = None;
                }
            }
            RealtimeCommand::Disconnect => {
                // Send phx_leave for all channels, then close.
                let topics: Vec<String> = cmd_channels.read().await.keys().cloned().collect();
                for topic in topics {
                    send_phoenix(&cmd_write, &topic, "phx_leave", serde_json::json!({})).await;
                }
                shutdown.store(true, Ordering::SeqCst);
                let mut writer = cmd_write.lock().await;
                let _ = writer.send(WsMessage::Close(None)).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_ref_is_monotonic() {
        let a: u64 = next_ref().parse().unwrap();
        let b: u64 = next_ref().parse().unwrap();
        assert!(b > a);
    }

    /// Drive the command forwarder over an in-memory sink and verify frame
    /// framing and pending-channel bookkeeping.
    #[tokio::test]
    async fn forwarder_tracks_pending_channels() {
        let (tx, rx) = mpsc::channel(16);
        let rx = Arc::new(Mutex::new(rx));
        let sink: Arc<Mutex<Vec<WsMessage>>> = Arc::new(Mutex::new(Vec::new()));
        let channels: Arc<RwLock<HashMap<String, PendingChannel>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        struct VecSink(Arc<Mutex<Vec<WsMessage>>>);
        impl futures_util::Sink<WsMessage> for VecSink {
            type Error = std::convert::Infallible;
            fn poll_ready(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<Result<(), Self::Error>> {
                std::task::Poll::Ready(Ok(()))
            }
            fn start_send(
                self: std::pin::Pin<&mut Self>,
                item: WsMessage,
            ) -> Result<(), Self::Error> {
                self.0.try_lock().unwrap().push(item);
                Ok(())
            }
            fn poll_flush(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<Result<(), Self::Error>> {
                std::task::Poll::Ready(Ok(()))
            }
            fn poll_close(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<Result<(), Self::Error>> {
                std::task::Poll::Ready(Ok(()))
            }
        }

        let writer = Arc::new(Mutex::new(VecSink(Arc::clone(&sink))));
        let handle = tokio::spawn(command_forwarder(
            rx,
            writer,
            Arc::clone(&channels),
            Arc::clone(&shutdown),
        ));

        tx.send(RealtimeCommand::JoinChannel {
            topic: "room-42".into(),
            config: ChannelConfig::default(),
        })
        .await
        .unwrap();
        tx.send(RealtimeCommand::PresenceTrack {
            topic: "room-42".into(),
            payload: serde_json::json!({"user_id": "u1"}),
        })
        .await
        .unwrap();
        tx.send(RealtimeCommand::Disconnect).await.unwrap();

        handle.await.unwrap();

        assert!(shutdown.load(Ordering::SeqCst));
        // Join + track + leave-on-disconnect + close frame.
        let frames = sink.lock().await;
        assert_eq!(frames.len(), 4);
        let join: PhoenixMessage = match &frames[0] {
            WsMessage::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        };
        assert_eq!(join.topic, "realtime:room-42");
        assert_eq!(join.event, "phx_join");
        assert!(matches!(&frames[3], WsMessage::Close(_)));

        // Track payload was recorded for reconnect replay, then the channel
        // map still holds the entry (leave-on-disconnect does not clear it).
        let channels = channels.read().await;
        let pending = channels.get("room-42").unwrap();
        assert_eq!(
            pending.presence_payload.as_ref().unwrap()["user_id"],
            "u1"
        );
    }
}
