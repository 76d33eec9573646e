//! Live change feed over one remote collection.
//!
//! Maintains a filtered view of insert/update/delete activity on a
//! collection and delivers each change to the matching local callback
//! without the caller polling. The transport layer is handled by
//! `studyhall_realtime::RealtimeClient`.

mod dispatcher;
mod subscription;
mod types;

pub use subscription::ChangeFeed;
pub use types::{ChangeFeedCallbacks, ChangeFeedConfig, FieldFilter, RowCallback};
