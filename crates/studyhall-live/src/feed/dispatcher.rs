//! Background task that dispatches transport events to feed callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use studyhall_realtime::{ChangeKind, RealtimeEvent};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::types::ChangeFeedCallbacks;

/// Drain transport events and dispatch row changes to the registered
/// callbacks.
///
/// Only events for the feed's *current* topic are dispatched; acks and
/// changes addressed to a topic from a prior activation are dropped. The
/// `active` flag is checked before every dispatch so no callback runs
/// after the owning feed is torn down.
pub(crate) async fn dispatch_events(
    mut events: mpsc::Receiver<RealtimeEvent>,
    topic: Arc<RwLock<Option<String>>>,
    subscribed: Arc<RwLock<bool>>,
    active: Arc<AtomicBool>,
    callbacks: ChangeFeedCallbacks,
) {
    while let Some(event) = events.recv().await {
        if !active.load(Ordering::SeqCst) {
            break;
        }
        match event {
            RealtimeEvent::ChannelJoined { topic: t } => {
                if topic.read().await.as_deref() == Some(t.as_str()) {
                    *subscribed.write().await = true;
                    debug!(topic = %t, "Change feed subscribed");
                } else {
                    debug!(topic = %t, "Join ack for stale feed topic");
                }
            }
            RealtimeEvent::ChannelError { topic: t, message } => {
                if topic.read().await.as_deref() == Some(t.as_str()) {
                    *subscribed.write().await = false;
                    warn!(topic = %t, message = %message, "Change feed channel error");
                }
            }
            RealtimeEvent::Disconnected => {
                *subscribed.write().await = false;
            }
            RealtimeEvent::PostgresChange {
                topic: t,
                kind,
                record,
                old_record,
            } => {
                if topic.read().await.as_deref() != Some(t.as_str()) {
                    debug!(topic = %t, "Row change for stale feed topic");
                    continue;
                }
                // Deletes only carry the old row; that is the row the
                // caller gets.
                let row = match kind {
                    ChangeKind::Insert | ChangeKind::Update => record,
                    ChangeKind::Delete => old_record.or(record),
                };
                let Some(row) = row else {
                    debug!(kind = kind.as_str(), "Row change without a row payload");
                    continue;
                };
                let callback = match kind {
                    ChangeKind::Insert => &callbacks.on_insert,
                    ChangeKind::Update => &callbacks.on_update,
                    ChangeKind::Delete => &callbacks.on_delete,
                };
                match callback {
                    Some(f) => f(row),
                    None => {
                        debug!(
                            kind = kind.as_str(),
                            "No handler registered for change kind, dropping event"
                        );
                    }
                }
            }
            _ => {}
        }
    }
}
