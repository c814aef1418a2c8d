//! Preview synchronizer: keeps `Conversation.last_message_*` consistent
//! with the live message set.
//!
//! All functions here are no-op on a missing conversation or message — the
//! calling operation has already validated existence — and never fail.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use loft_types::models::Message;

use crate::Tables;

/// Longest preview stored on a conversation, in visible characters.
pub const PREVIEW_MAX_CHARS: usize = 80;

/// Trim and truncate message content for the conversation preview.
/// Truncation appends a single ellipsis character, so the result is at
/// most `PREVIEW_MAX_CHARS + 1` chars long.
pub fn truncate_preview(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= PREVIEW_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
    preview.push('…');
    preview
}

/// A freshly created message is by construction the newest in its
/// conversation: adopt it as the preview unconditionally.
pub fn set_latest(tables: &mut Tables, message: &Message, now: DateTime<Utc>) {
    let Some(conversation) = tables.conversations.get_mut(&message.conversation_id) else {
        return;
    };
    conversation.last_message_id = Some(message.id);
    conversation.last_message_at = Some(message.created_at);
    conversation.last_message_preview = truncate_preview(&message.content);
    conversation.updated_at = now;
}

/// After a content edit: only the conversation's current latest message can
/// change the preview text. Edits to older messages never touch the
/// conversation.
pub fn refresh_after_edit(tables: &mut Tables, message: &Message, now: DateTime<Utc>) {
    let Some(conversation) = tables.conversations.get_mut(&message.conversation_id) else {
        return;
    };
    if conversation.last_message_id != Some(message.id) {
        return;
    }
    conversation.last_message_preview = truncate_preview(&message.content);
    conversation.updated_at = now;
}

/// After a delete: if the removed message was the preview source, re-derive
/// the preview from the remaining messages, or clear it when none remain.
pub fn refresh_after_delete(
    tables: &mut Tables,
    conversation_id: Uuid,
    deleted_id: Uuid,
    now: DateTime<Utc>,
) {
    let Some(conversation) = tables.conversations.get(&conversation_id) else {
        return;
    };
    if conversation.last_message_id != Some(deleted_id) {
        return;
    }

    let latest = latest_message(tables, conversation_id).cloned();

    // Second lookup: `latest_message` needs shared access to the message map.
    let Some(conversation) = tables.conversations.get_mut(&conversation_id) else {
        return;
    };
    match latest {
        Some(message) => {
            conversation.last_message_id = Some(message.id);
            conversation.last_message_at = Some(message.created_at);
            conversation.last_message_preview = truncate_preview(&message.content);
        }
        None => {
            conversation.last_message_id = None;
            conversation.last_message_at = None;
            conversation.last_message_preview = String::new();
        }
    }
    conversation.updated_at = now;
}

/// Newest remaining message in a conversation. Equal `created_at` values
/// are broken by id descending, so recomputation is deterministic.
fn latest_message(tables: &Tables, conversation_id: Uuid) -> Option<&Message> {
    tables
        .messages
        .values()
        .filter(|m| m.conversation_id == conversation_id)
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}
