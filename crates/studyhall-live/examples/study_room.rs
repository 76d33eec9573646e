//! Composition-root demo: join a study room and watch course progress.
//!
//! Reads backend coordinates from the Studyhall config file, opens a
//! presence session plus a filtered change feed, and bridges both onto an
//! `EventBus` the way a UI surface would consume them.
//!
//! Run with `STUDYHALL_USER=u1 cargo run --example study_room`.

use std::sync::Arc;

use studyhall_common::{Event, EventBus};
use studyhall_config::load_config;
use studyhall_live::{
    ChangeFeed, ChangeFeedCallbacks, ChangeFeedConfig, Identity, LiveRegistry,
    PresenceCallbacks, PresenceSession, PresenceSessionConfig,
};
use studyhall_realtime::RealtimeConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let user_id = std::env::var("STUDYHALL_USER").unwrap_or_else(|_| "demo-user".into());
    let display_name = std::env::var("STUDYHALL_NAME").unwrap_or_else(|_| "Demo".into());
    let identity = Identity::new(user_id, display_name);

    let rt_config = RealtimeConfig {
        project_ref: config.backend.project_ref.clone(),
        api_key: config.backend.api_key.clone(),
        access_token: None,
        heartbeat_interval_secs: config.realtime.heartbeat_interval,
        reconnect_delay_secs: config.realtime.reconnect_delay,
        max_reconnect_delay_secs: config.realtime.max_reconnect_delay,
        event_buffer: config.realtime.event_buffer as usize,
    };

    let registry = LiveRegistry::new();
    let bus = Arc::new(EventBus::new(64));

    // Presence in the general study room.
    let room = format!("{}:general", config.presence.room_prefix);
    let sync_bus = Arc::clone(&bus);
    let join_bus = Arc::clone(&bus);
    let leave_bus = Arc::clone(&bus);
    let sync_room = room.clone();
    let join_room = room.clone();
    let leave_room = room.clone();
    let presence_callbacks = PresenceCallbacks::new()
        .on_sync(move |snapshot| {
            sync_bus.publish(Event::PresenceSynced {
                channel: sync_room.clone(),
                online_count: snapshot.len() as u32,
            });
        })
        .on_join(move |key, _payload| {
            join_bus.publish(Event::ParticipantJoined {
                channel: join_room.clone(),
                user_id: key.to_string(),
            });
        })
        .on_leave(move |key, _payload| {
            leave_bus.publish(Event::ParticipantLeft {
                channel: leave_room.clone(),
                user_id: key.to_string(),
            });
        });

    let mut session = PresenceSession::connect(
        rt_config.clone(),
        &registry,
        Some(identity.clone()),
        PresenceSessionConfig::new(room.as_str())
            .with_payload("name", serde_json::json!(identity.display_name)),
        presence_callbacks,
    )
    .await?;

    // Live course progress for this user.
    let insert_bus = Arc::clone(&bus);
    let update_bus = Arc::clone(&bus);
    let feed_callbacks = ChangeFeedCallbacks::new()
        .on_insert(move |_row| {
            insert_bus.publish(Event::RowChanged {
                collection: "course_progress".into(),
                kind: "insert".into(),
            });
        })
        .on_update(move |_row| {
            update_bus.publish(Event::RowChanged {
                collection: "course_progress".into(),
                kind: "update".into(),
            });
        });

    let mut feed = ChangeFeed::connect(
        rt_config,
        &registry,
        ChangeFeedConfig::new("course_progress").with_filter("user_id", identity.user_id.as_str()),
        feed_callbacks,
    )
    .await?;

    // Render-loop stand-in: print bus events until Ctrl-C.
    let mut events = bus.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => println!("{event:?}"),
                Err(_) => break,
            },
        }
    }

    feed.close().await;
    session.close().await;
    Ok(())
}
