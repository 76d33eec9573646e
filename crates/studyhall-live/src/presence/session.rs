//! Owning handle for a presence session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use studyhall_common::LiveError;
use studyhall_realtime::{
    BroadcastConfig, ChannelConfig, PresenceKeyConfig, RealtimeClient, RealtimeConfig,
    RealtimeEvent,
};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use super::reconciler::{compose_tracked_payload, reconcile_events, SessionState};
use super::types::{PresenceCallbacks, PresenceSessionConfig, PresenceSnapshot};
use crate::identity::Identity;
use crate::protocol::Participant;
use crate::registry::{LiveRegistry, TargetClaim};

/// Transport and bookkeeping held only while a channel is actually open.
#[derive(Debug)]
struct ActiveSession {
    client: RealtimeClient,
    _claim: TargetClaim,
    _reconciler: JoinHandle<()>,
}

/// This client's presence in a named shared channel.
///
/// Without an authenticated identity the session is inert: no channel is
/// opened, `is_connected()` stays false, and every operation is a no-op.
/// At most one session may be live per channel name per registry.
#[derive(Debug)]
pub struct PresenceSession {
    channel: String,
    state: Arc<SessionState>,
    session: Option<ActiveSession>,
}

impl PresenceSession {
    /// Connect a new transport and attach a session to it.
    ///
    /// With no identity the session is inert and no connection is made.
    pub async fn connect(
        rt_config: RealtimeConfig,
        registry: &LiveRegistry,
        identity: Option<Identity>,
        config: PresenceSessionConfig,
        callbacks: PresenceCallbacks,
    ) -> Result<Self, LiveError> {
        if config.channel.is_empty() {
            return Err(LiveError::EmptyChannel);
        }
        let Some(identity) = identity else {
            debug!(channel = %config.channel, "Presence requested without identity; staying inert");
            return Ok(Self::inert(config));
        };
        let (client, events) = RealtimeClient::connect(rt_config);
        Self::attach(client, events, registry, Some(identity), config, callbacks).await
    }

    /// Attach a session to an existing transport (or an in-process fake).
    pub async fn attach(
        client: RealtimeClient,
        events: mpsc::Receiver<RealtimeEvent>,
        registry: &LiveRegistry,
        identity: Option<Identity>,
        config: PresenceSessionConfig,
        callbacks: PresenceCallbacks,
    ) -> Result<Self, LiveError> {
        if config.channel.is_empty() {
            return Err(LiveError::EmptyChannel);
        }
        let Some(identity) = identity else {
            debug!(channel = %config.channel, "Presence requested without identity; staying inert");
            return Ok(Self::inert(config));
        };
        let claim = registry.claim_channel(&config.channel)?;

        let channel = config.channel;
        let presence_key = identity.user_id.clone();
        let state = Arc::new(SessionState {
            connected: RwLock::new(false),
            active: AtomicBool::new(true),
            identity: RwLock::new(identity),
            tracked: RwLock::new(config.initial_payload),
            snapshot: RwLock::new(PresenceSnapshot::new()),
        });

        let reconciler = tokio::spawn(reconcile_events(
            events,
            client.clone_sender(),
            channel.clone(),
            Arc::clone(&state),
            callbacks,
        ));

        client
            .join_channel(&channel, channel_config(presence_key))
            .await;

        Ok(Self {
            channel,
            state,
            session: Some(ActiveSession {
                client,
                _claim: claim,
                _reconciler: reconciler,
            }),
        })
    }

    fn inert(config: PresenceSessionConfig) -> Self {
        Self {
            channel: config.channel,
            state: Arc::new(SessionState {
                connected: RwLock::new(false),
                active: AtomicBool::new(false),
                identity: RwLock::new(Identity::new("", "")),
                tracked: RwLock::new(config.initial_payload),
                snapshot: RwLock::new(PresenceSnapshot::new()),
            }),
            session: None,
        }
    }

    /// Merge `payload` over the tracked payload (new fields win) and
    /// republish. No-op until the channel is established.
    pub async fn track(&self, payload: serde_json::Map<String, serde_json::Value>) {
        let Some(session) = &self.session else {
            return;
        };
        if !*self.state.connected.read().await {
            debug!(channel = %self.channel, "Track before channel established, ignoring");
            return;
        }
        {
            let mut tracked = self.state.tracked.write().await;
            for (key, value) in payload {
                tracked.insert(key, value);
            }
        }
        let composed = compose_tracked_payload(&self.state).await;
        session.client.presence_track(&self.channel, composed).await;
    }

    /// Remove this client's presence without closing the channel. No-op
    /// if the channel does not exist.
    pub async fn untrack(&self) {
        let Some(session) = &self.session else {
            return;
        };
        if !*self.state.connected.read().await {
            debug!(channel = %self.channel, "Untrack before channel established, ignoring");
            return;
        }
        session.client.presence_untrack(&self.channel).await;
    }

    /// Fire-and-forget a named broadcast to the other channel members.
    /// No-op if the channel does not exist.
    pub async fn send_broadcast(&self, event: &str, payload: serde_json::Value) {
        let Some(session) = &self.session else {
            return;
        };
        if !*self.state.connected.read().await {
            debug!(channel = %self.channel, event = %event, "Broadcast before channel established, ignoring");
            return;
        }
        session.client.broadcast(&self.channel, event, payload).await;
    }

    /// Re-establish presence under a new identity.
    ///
    /// Leaves the channel and rejoins keyed by the new identity; the
    /// tracked payload is republished after the new join is acknowledged.
    pub async fn rebind_identity(&self, identity: Identity) {
        let Some(session) = &self.session else {
            debug!(channel = %self.channel, "Inert session ignores identity change");
            return;
        };
        let presence_key = identity.user_id.clone();
        *self.state.connected.write().await = false;
        session.client.leave_channel(&self.channel).await;
        *self.state.identity.write().await = identity;
        session
            .client
            .join_channel(&self.channel, channel_config(presence_key))
            .await;
    }

    /// True once the service has acknowledged the channel join; never
    /// true optimistically.
    pub async fn is_connected(&self) -> bool {
        *self.state.connected.read().await
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current consolidated membership snapshot.
    pub async fn presence_snapshot(&self) -> PresenceSnapshot {
        self.state.snapshot.read().await.clone()
    }

    /// Participants parsed from the snapshot (first payload per key).
    pub async fn participants(&self) -> Vec<Participant> {
        self.state
            .snapshot
            .read()
            .await
            .values()
            .filter_map(|metas| Participant::from_metas(metas))
            .collect()
    }

    /// Leave the channel and stop the transport.
    ///
    /// Safe to call multiple times; events already in flight are ignored
    /// once this returns.
    pub async fn close(&mut self) {
        if !self.state.active.swap(false, Ordering::SeqCst) {
            return;
        }
        *self.state.connected.write().await = false;
        if let Some(session) = self.session.take() {
            session.client.leave_channel(&self.channel).await;
            session.client.disconnect().await;
        }
    }
}

impl Drop for PresenceSession {
    fn drop(&mut self) {
        self.state.active.store(false, Ordering::SeqCst);
        if let Some(session) = &self.session {
            // The disconnect command leaves all channels before closing
            // the socket. No-op if close() already ran.
            session.client.disconnect_now();
        }
    }
}

fn channel_config(presence_key: String) -> ChannelConfig {
    ChannelConfig {
        broadcast: BroadcastConfig {
            self_send: false,
            ack: true,
        },
        presence: PresenceKeyConfig { key: presence_key },
        postgres_changes: Vec::new(),
    }
}
