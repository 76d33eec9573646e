//! Live state-binding layer for Studyhall UI surfaces.
//!
//! Binds dashboards, collaborative reading sessions, and live classes to
//! the backend's realtime service: filtered row-change feeds, presence
//! channels with broadcast, and a thin reader for historical rows. The
//! transport is handled by `studyhall_realtime::RealtimeClient`.

pub mod activity;
pub mod feed;
pub mod identity;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod store;

pub use activity::{ActivityKind, ActivityLog, ActivityRecord};
pub use feed::{ChangeFeed, ChangeFeedCallbacks, ChangeFeedConfig, FieldFilter};
pub use identity::Identity;
pub use presence::{
    PresenceCallbacks, PresenceSession, PresenceSessionConfig, PresenceSnapshot,
};
pub use protocol::{
    events, ChatMessagePayload, HandRaisePayload, Participant, ParticipantStatus,
    PresencePayload, ProgressUpdatePayload, ReactionPayload,
};
pub use registry::{LiveRegistry, TargetClaim};
pub use store::{StoreClient, StoreConfig};
