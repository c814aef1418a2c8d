use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    #[default]
    Direct,
    Group,
}

/// A conversation owned by a single user. The `last_message_*` triple is a
/// denormalized preview of the newest non-deleted message; the store keeps
/// it consistent on every message create/edit/delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ConversationKind,
    pub name: String,
    pub participants: Vec<Uuid>,
    pub last_message_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: String,
    pub unread_count: u32,
    pub is_pinned: bool,
    pub is_muted: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub attachments: Vec<Attachment>,
    pub reply_to_id: Option<Uuid>,
    pub is_edited: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File metadata attached to a message. Only `kind`, `url` and `filename`
/// are required by clients; the rest depends on the media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub filename: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

/// A client-reported analytics event. `event_id` is generated on the client
/// and acts as the idempotency key: the first ingestion of an id wins and
/// later payloads for the same id are discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_id: String,
    /// None marks the event anonymous; anonymous events are never returned
    /// by per-user queries.
    pub user_id: Option<Uuid>,
    pub event_name: String,
    pub properties: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
    pub device_id: Option<String>,
    pub platform: Option<String>,
    pub app_version: Option<String>,
    /// Server-assigned at ingestion time.
    pub created_at: DateTime<Utc>,
}
