use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Attachment, ConversationKind, MessageKind};

// -- JWT Claims --

/// JWT claims shared between loft-api's REST middleware and any future
/// transport. Canonical definition lives here in loft-types to eliminate
/// duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Conversations --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewConversation {
    #[serde(default)]
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

/// Direct field updates on a conversation. All fields optional; absent
/// fields are left untouched. The preview triple is derived state and is
/// not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationPatch {
    pub name: Option<String>,
    pub participants: Option<Vec<Uuid>>,
    pub unread_count: Option<u32>,
    pub is_pinned: Option<bool>,
    pub is_muted: Option<bool>,
    pub is_archived: Option<bool>,
}

// -- Messages --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMessage {
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub reply_to_id: Option<Uuid>,
    #[serde(default)]
    pub sender_name: String,
}

/// Partial update of a message. A patch that changes `content` marks the
/// message edited unless `is_edited` is supplied explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub is_edited: Option<bool>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

// -- Search --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub conversation_id: Option<Uuid>,
    pub limit: Option<usize>,
}

// -- Analytics --

/// Client identity block attached to an ingested event. Projected onto the
/// stored record's top-level scoping fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventIdentity {
    pub user_id: Option<Uuid>,
    pub device_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestEvent {
    pub event_id: String,
    pub event_name: String,
    #[serde(default)]
    pub properties: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub identity: EventIdentity,
    pub platform: Option<String>,
    pub app_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestRequest {
    pub events: Vec<IngestEvent>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ingested: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Comma-separated on the wire; empty means "all events".
    #[serde(default)]
    pub event_names: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: usize,
}
