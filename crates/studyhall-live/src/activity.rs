//! Typed activity records logged by UI surfaces.
//!
//! Each activity carries a tagged kind rather than an open-ended metadata
//! map; kinds this client does not know about deserialize to `Other` so
//! records written by newer clients still round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StoreClient;
use studyhall_common::StoreError;

/// What a participant did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    LessonCompleted {
        course_id: String,
        lesson_id: String,
    },
    QuizSubmitted {
        course_id: String,
        score: u32,
    },
    CourseEnrolled {
        course_id: String,
    },
    RoomJoined {
        room: String,
    },
    #[serde(other)]
    Other,
}

/// One activity-feed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(user_id: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }
}

/// Sink that appends activity records to the store.
pub struct ActivityLog {
    store: StoreClient,
    collection: String,
}

impl ActivityLog {
    pub fn new(store: StoreClient) -> Self {
        Self {
            store,
            collection: "activity_log".into(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Append one record. Failures are returned, not retried; activity
    /// logging is best-effort from the caller's point of view.
    pub async fn record(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        let row = serde_json::to_value(record)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        self.store.insert(&self.collection, &row).await
    }
}
