//! Protocol types for the Studyhall live layer.
//!
//! These types define the application-level payloads that ride inside
//! realtime broadcast messages and presence tracking. The transport
//! envelope (Phoenix Channels protocol) is handled by `studyhall_realtime`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Broadcast event names
// ---------------------------------------------------------------------------

/// Event names used in realtime broadcasts.
pub mod events {
    pub const CHAT_MESSAGE: &str = "chat_message";
    pub const PROGRESS_UPDATE: &str = "progress_update";
    pub const HAND_RAISE: &str = "hand_raise";
    pub const REACTION: &str = "reaction";
}

// ---------------------------------------------------------------------------
// Broadcast payloads
// ---------------------------------------------------------------------------

/// Payload for chat message broadcasts in a study room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub user_id: String,
    pub display_name: String,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Payload for course-progress broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdatePayload {
    pub user_id: String,
    pub display_name: String,
    pub course_id: String,
    pub lesson_id: String,
    pub percent_complete: f32,
}

/// Payload for hand-raise broadcasts in a live class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandRaisePayload {
    pub user_id: String,
    pub display_name: String,
    pub raised: bool,
}

/// Payload for emoji-reaction broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionPayload {
    pub user_id: String,
    pub display_name: String,
    pub emoji: String,
}

/// Payload tracked in presence for each participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresencePayload {
    pub user_id: String,
    pub display_name: String,
    pub status: ParticipantStatus,
    pub activity: Option<String>,
    pub online_at: String,
}

// ---------------------------------------------------------------------------
// Shared types
// ---------------------------------------------------------------------------

/// Participant presence status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Online,
    Studying,
    InClass,
    Idle,
    Away,
}

/// Information about a participant currently in a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub status: ParticipantStatus,
    pub activity: Option<String>,
}

impl Participant {
    /// Parse a participant from presence meta entries.
    ///
    /// Only the first meta is considered; a participant with several
    /// concurrent connections keeps all of them in the presence snapshot,
    /// but summaries use the first.
    pub fn from_metas(metas: &[serde_json::Value]) -> Option<Self> {
        let meta = metas.first()?;
        Some(Self {
            user_id: meta.get("user_id")?.as_str()?.to_string(),
            display_name: meta
                .get("display_name")
                .and_then(|n| n.as_str())
                .unwrap_or("Unknown")
                .to_string(),
            status: meta
                .get("status")
                .and_then(|s| serde_json::from_value(s.clone()).ok())
                .unwrap_or_default(),
            activity: meta
                .get("activity")
                .and_then(|a| a.as_str())
                .map(|s| s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_status_snake_case() {
        let json = serde_json::to_string(&ParticipantStatus::InClass).unwrap();
        assert_eq!(json, "\"in_class\"");
        let back: ParticipantStatus = serde_json::from_str("\"studying\"").unwrap();
        assert_eq!(back, ParticipantStatus::Studying);
    }

    #[test]
    fn participant_from_first_meta() {
        let metas = vec![
            serde_json::json!({
                "user_id": "u1",
                "display_name": "Alice",
                "status": "studying",
                "activity": "Chapter 3"
            }),
            serde_json::json!({"user_id": "u1", "display_name": "Alice-tablet"}),
        ];
        let participant = Participant::from_metas(&metas).unwrap();
        assert_eq!(participant.user_id, "u1");
        assert_eq!(participant.display_name, "Alice");
        assert_eq!(participant.status, ParticipantStatus::Studying);
        assert_eq!(participant.activity.as_deref(), Some("Chapter 3"));
    }

    #[test]
    fn participant_requires_user_id() {
        let metas = vec![serde_json::json!({"display_name": "ghost"})];
        assert!(Participant::from_metas(&metas).is_none());
        assert!(Participant::from_metas(&[]).is_none());
    }

    #[test]
    fn participant_defaults_for_missing_fields() {
        let metas = vec![serde_json::json!({"user_id": "u2"})];
        let participant = Participant::from_metas(&metas).unwrap();
        assert_eq!(participant.display_name, "Unknown");
        assert_eq!(participant.status, ParticipantStatus::Online);
        assert!(participant.activity.is_none());
    }

    #[test]
    fn chat_payload_skips_missing_reply() {
        let payload = ChatMessagePayload {
            user_id: "u1".into(),
            display_name: "Alice".into(),
            content: "hello".into(),
            timestamp: "1700000000000".into(),
            reply_to: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("reply_to"));
    }

    #[test]
    fn presence_payload_roundtrip() {
        let payload = PresencePayload {
            user_id: "u1".into(),
            display_name: "Alice".into(),
            status: ParticipantStatus::Online,
            activity: None,
            online_at: "1700000000000".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "online");
        let back: PresencePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back.user_id, "u1");
    }
}
