//! Background task that reconciles transport events into presence state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use studyhall_realtime::{RealtimeClient, RealtimeEvent};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::types::{PresenceCallbacks, PresenceSnapshot};
use crate::identity::Identity;

/// Shared mutable state between the session handle and its reconciler.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) connected: RwLock<bool>,
    pub(crate) active: AtomicBool,
    pub(crate) identity: RwLock<Identity>,
    /// This client's tracked payload; merged-over and republished by
    /// `track`.
    pub(crate) tracked: RwLock<serde_json::Map<String, serde_json::Value>>,
    pub(crate) snapshot: RwLock<PresenceSnapshot>,
}

/// Compose the payload published as this client's presence: the tracked
/// payload merged with the participant identity and an online-since
/// timestamp.
pub(crate) async fn compose_tracked_payload(state: &SessionState) -> serde_json::Value {
    let identity = state.identity.read().await;
    let mut tracked = state.tracked.write().await;
    tracked.insert(
        "user_id".into(),
        serde_json::Value::String(identity.user_id.clone()),
    );
    tracked
        .entry("display_name".to_string())
        .or_insert_with(|| serde_json::Value::String(identity.display_name.clone()));
    tracked.insert(
        "online_at".into(),
        serde_json::Value::String(super::helpers::epoch_millis()),
    );
    serde_json::Value::Object(tracked.clone())
}

/// Drain transport events for one presence channel.
///
/// Publishes the initial presence payload only once the service has
/// acknowledged the join; the service drops anything published earlier.
/// The `active` flag is checked before every dispatch so no callback
/// runs after the owning session is torn down.
pub(crate) async fn reconcile_events(
    mut events: mpsc::Receiver<RealtimeEvent>,
    client: RealtimeClient,
    channel: String,
    state: Arc<SessionState>,
    callbacks: PresenceCallbacks,
) {
    while let Some(event) = events.recv().await {
        if !state.active.load(Ordering::SeqCst) {
            break;
        }
        match event {
            RealtimeEvent::ChannelJoined { topic } if topic == channel => {
                *state.connected.write().await = true;
                info!(channel = %channel, "Presence channel joined");
                let payload = compose_tracked_payload(&state).await;
                client.presence_track(&channel, payload).await;
            }
            RealtimeEvent::ChannelError { topic, message } if topic == channel => {
                *state.connected.write().await = false;
                warn!(channel = %channel, message = %message, "Presence channel error");
            }
            RealtimeEvent::PresenceState { topic, state: new_state } if topic == channel => {
                // Full snapshot: replaces everything we had.
                let snapshot = {
                    let mut current = state.snapshot.write().await;
                    *current = new_state;
                    current.clone()
                };
                debug!(channel = %channel, participants = snapshot.len(), "Presence state replaced");
                if let Some(on_sync) = &callbacks.on_sync {
                    on_sync(snapshot);
                }
            }
            RealtimeEvent::PresenceDiff { topic, joins, leaves } if topic == channel => {
                let snapshot = {
                    let mut current = state.snapshot.write().await;
                    for (key, metas) in &joins {
                        current.insert(key.clone(), metas.clone());
                    }
                    for key in leaves.keys() {
                        current.remove(key);
                    }
                    current.clone()
                };
                if let Some(on_join) = &callbacks.on_join {
                    for (key, metas) in &joins {
                        if let Some(first) = metas.first() {
                            on_join(key, first.clone());
                        }
                    }
                }
                if let Some(on_leave) = &callbacks.on_leave {
                    for (key, metas) in &leaves {
                        if let Some(first) = metas.first() {
                            on_leave(key, first.clone());
                        }
                    }
                }
                if let Some(on_sync) = &callbacks.on_sync {
                    on_sync(snapshot);
                }
            }
            RealtimeEvent::Broadcast { topic, event, payload } if topic == channel => {
                match &callbacks.on_broadcast {
                    Some(on_broadcast) => on_broadcast(&event, payload),
                    None => debug!(event = %event, "No broadcast handler registered, dropping"),
                }
            }
            RealtimeEvent::Disconnected => {
                *state.connected.write().await = false;
                // Membership is unknown while offline; clear and let the
                // UI render empty until the next snapshot.
                let snapshot = {
                    let mut current = state.snapshot.write().await;
                    current.clear();
                    current.clone()
                };
                if let Some(on_sync) = &callbacks.on_sync {
                    on_sync(snapshot);
                }
            }
            _ => {}
        }
    }
}
