//! Owning handle for a live change feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use studyhall_common::{id::short_id, LiveError};
use studyhall_realtime::{
    ChannelConfig, PostgresChangesConfig, RealtimeClient, RealtimeConfig, RealtimeEvent,
};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use super::dispatcher::dispatch_events;
use super::types::{ChangeFeedCallbacks, ChangeFeedConfig, FieldFilter};
use crate::registry::{LiveRegistry, TargetClaim};

/// A live, filtered view of insert/update/delete activity on one remote
/// collection.
///
/// Owns its transport connection and a dispatcher task. At most one feed
/// may be live per `(collection, filter)` pair per registry; constructing
/// a second fails with [`LiveError::DuplicateTarget`].
#[derive(Debug)]
pub struct ChangeFeed {
    client: RealtimeClient,
    registry: LiveRegistry,
    claim: TargetClaim,
    collection: String,
    filter: Option<FieldFilter>,
    enabled: bool,
    /// Current channel topic; regenerated on every activation so acks and
    /// events from a torn-down activation never match.
    topic: Arc<RwLock<Option<String>>>,
    subscribed: Arc<RwLock<bool>>,
    active: Arc<AtomicBool>,
    _dispatcher: JoinHandle<()>,
}

impl ChangeFeed {
    /// Connect a new transport and attach a feed to it.
    pub async fn connect(
        rt_config: RealtimeConfig,
        registry: &LiveRegistry,
        config: ChangeFeedConfig,
        callbacks: ChangeFeedCallbacks,
    ) -> Result<Self, LiveError> {
        let (client, events) = RealtimeClient::connect(rt_config);
        Self::attach(client, events, registry, config, callbacks).await
    }

    /// Attach a feed to an existing transport (or an in-process fake).
    pub async fn attach(
        client: RealtimeClient,
        events: mpsc::Receiver<RealtimeEvent>,
        registry: &LiveRegistry,
        config: ChangeFeedConfig,
        callbacks: ChangeFeedCallbacks,
    ) -> Result<Self, LiveError> {
        if config.collection.is_empty() {
            return Err(LiveError::EmptyCollection);
        }
        let claim = registry.claim_feed(&config.collection, config.filter.as_ref())?;

        let topic = Arc::new(RwLock::new(None));
        let subscribed = Arc::new(RwLock::new(false));
        let active = Arc::new(AtomicBool::new(true));

        let dispatcher = tokio::spawn(dispatch_events(
            events,
            Arc::clone(&topic),
            Arc::clone(&subscribed),
            Arc::clone(&active),
            callbacks,
        ));

        let mut feed = Self {
            client,
            registry: registry.clone(),
            claim,
            collection: config.collection,
            filter: config.filter,
            enabled: false,
            topic,
            subscribed,
            active,
            _dispatcher: dispatcher,
        };
        if config.enabled {
            feed.set_enabled(true).await;
        }
        Ok(feed)
    }

    /// Enable or disable the feed.
    ///
    /// Enabling joins a freshly-named channel; disabling leaves the
    /// current one. Re-invocation with the current state is a no-op.
    pub async fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.join_fresh_topic().await;
        } else {
            self.leave_current_topic().await;
        }
    }

    /// Point the feed at a new `(collection, filter)` target.
    ///
    /// Claims the new target first (failing fast on a duplicate), then
    /// performs exactly one leave followed by one join; the old and new
    /// subscriptions are never live simultaneously.
    pub async fn retarget(
        &mut self,
        collection: impl Into<String>,
        filter: Option<FieldFilter>,
    ) -> Result<(), LiveError> {
        let collection = collection.into();
        if collection.is_empty() {
            return Err(LiveError::EmptyCollection);
        }
        let same_target = collection == self.collection && filter == self.filter;
        if !same_target {
            // Assigning replaces (and thereby releases) the old claim only
            // after the new one is held.
            self.claim = self
                .registry
                .claim_feed(&collection, filter.as_ref())?;
            self.collection = collection;
            self.filter = filter;
        }
        if self.enabled {
            self.leave_current_topic().await;
            self.join_fresh_topic().await;
        }
        Ok(())
    }

    /// Whether the service has acknowledged the current subscription.
    ///
    /// False until the join ack arrives; never true optimistically.
    pub async fn is_subscribed(&self) -> bool {
        *self.subscribed.read().await
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filter(&self) -> Option<&FieldFilter> {
        self.filter.as_ref()
    }

    /// Release the subscription and stop the transport.
    ///
    /// Safe to call multiple times; events already in flight are ignored
    /// once this returns.
    pub async fn close(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        self.enabled = false;
        self.leave_current_topic().await;
        self.client.disconnect().await;
    }

    async fn join_fresh_topic(&self) {
        let topic = format!("{}-changes-{}", self.collection, short_id());
        *self.topic.write().await = Some(topic.clone());
        *self.subscribed.write().await = false;
        let config = ChannelConfig {
            postgres_changes: vec![PostgresChangesConfig::all(
                self.collection.clone(),
                self.filter.as_ref().map(FieldFilter::to_expr),
            )],
            ..Default::default()
        };
        self.client.join_channel(&topic, config).await;
    }

    async fn leave_current_topic(&self) {
        let old = self.topic.write().await.take();
        *self.subscribed.write().await = false;
        if let Some(topic) = old {
            self.client.leave_channel(&topic).await;
        }
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        // The dispatcher checks this flag before every callback, so an
        // event already in flight is dropped rather than dispatched.
        self.active.store(false, Ordering::SeqCst);
        // Best-effort: the disconnect command leaves all channels before
        // closing the socket. No-op if close() already ran.
        self.client.disconnect_now();
    }
}
