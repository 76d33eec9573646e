//! Presence session over a named shared channel.
//!
//! Tracks this client's presence payload, reconciles the membership
//! snapshot on every change, and provides broadcast send/receive. The
//! transport layer is handled by `studyhall_realtime::RealtimeClient`.

mod helpers;
mod reconciler;
mod session;
mod types;

pub use session::PresenceSession;
pub use types::{
    BroadcastCallback, MemberCallback, PresenceCallbacks, PresenceSessionConfig,
    PresenceSnapshot, SyncCallback,
};
