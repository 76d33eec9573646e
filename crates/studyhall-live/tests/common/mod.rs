//! In-process fake realtime service for integration tests.
//!
//! Stands in for the network connection task behind a detached
//! `RealtimeClient`: drains commands, records them, and (optionally)
//! acknowledges joins the way the real service would.

use std::collections::HashSet;
use std::sync::Arc;

use studyhall_realtime::{ChannelConfig, RealtimeClient, RealtimeCommand, RealtimeEvent};
use tokio::sync::{mpsc, Mutex};

/// Everything the fake service observed, in arrival order.
#[derive(Default)]
pub struct FakeLog {
    /// Command order, e.g. `join:topic`, `leave:topic`, `track:topic`.
    pub ops: Vec<String>,
    pub joins: Vec<(String, ChannelConfig)>,
    pub leaves: Vec<String>,
    pub tracks: Vec<(String, serde_json::Value)>,
    pub untracks: Vec<String>,
    pub broadcasts: Vec<(String, String, serde_json::Value)>,
    pub disconnects: usize,
    /// Topics whose join has been acknowledged.
    pub acked: HashSet<String>,
    /// Set when a track arrives for a topic whose join was not yet
    /// acknowledged; the real service would drop such a publish.
    pub premature_track: bool,
}

pub struct FakeBackend {
    pub log: Arc<Mutex<FakeLog>>,
    /// Inject service-side events (acks, presence frames, row changes).
    pub events: mpsc::Sender<RealtimeEvent>,
}

impl FakeBackend {
    pub async fn joined_topic(&self, index: usize) -> String {
        self.log.lock().await.joins[index].0.clone()
    }
}

/// Spawn a fake realtime service behind a detached client.
///
/// With `auto_ack` the fake confirms every join immediately, like a
/// healthy service; without it the test script acknowledges joins by
/// sending `ChannelJoined` through `FakeBackend::events`.
pub fn spawn_fake(
    auto_ack: bool,
) -> (RealtimeClient, mpsc::Receiver<RealtimeEvent>, FakeBackend) {
    let (client, mut command_rx) = RealtimeClient::detached(64);
    let (event_tx, event_rx) = mpsc::channel(64);
    let log = Arc::new(Mutex::new(FakeLog::default()));

    let task_log = Arc::clone(&log);
    let task_events = event_tx.clone();
    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                RealtimeCommand::JoinChannel { topic, config } => {
                    {
                        let mut log = task_log.lock().await;
                        log.ops.push(format!("join:{topic}"));
                        log.joins.push((topic.clone(), config));
                        if auto_ack {
                            log.acked.insert(topic.clone());
                        }
                    }
                    if auto_ack {
                        let _ = task_events
                            .send(RealtimeEvent::ChannelJoined { topic })
                            .await;
                    }
                }
                RealtimeCommand::LeaveChannel { topic } => {
                    let mut log = task_log.lock().await;
                    log.ops.push(format!("leave:{topic}"));
                    log.acked.remove(&topic);
                    log.leaves.push(topic);
                }
                RealtimeCommand::PresenceTrack { topic, payload } => {
                    let mut log = task_log.lock().await;
                    log.ops.push(format!("track:{topic}"));
                    if !log.acked.contains(&topic) {
                        log.premature_track = true;
                    }
                    log.tracks.push((topic, payload));
                }
                RealtimeCommand::PresenceUntrack { topic } => {
                    let mut log = task_log.lock().await;
                    log.ops.push(format!("untrack:{topic}"));
                    log.untracks.push(topic);
                }
                RealtimeCommand::Broadcast {
                    topic,
                    event,
                    payload,
                } => {
                    let mut log = task_log.lock().await;
                    log.ops.push(format!("broadcast:{topic}:{event}"));
                    log.broadcasts.push((topic, event, payload));
                }
                RealtimeCommand::Disconnect => {
                    let mut log = task_log.lock().await;
                    log.ops.push("disconnect".into());
                    log.disconnects += 1;
                }
            }
        }
    });

    (
        client,
        event_rx,
        FakeBackend {
            log,
            events: event_tx,
        },
    )
}

/// Let all queued messages flow through the channel hops.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
