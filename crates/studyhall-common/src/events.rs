use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Render-triggering notifications published by the live layer for UI
/// surfaces (dashboards, reading sessions, live classes) to consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    FeedConnected { collection: String },
    FeedDisconnected { collection: String },
    RowChanged { collection: String, kind: String },
    PresenceSynced { channel: String, online_count: u32 },
    ParticipantJoined { channel: String, user_id: String },
    ParticipantLeft { channel: String, user_id: String },
    BroadcastReceived { channel: String, event: String },
    ActivityLogged { user_id: String, kind: String },
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
