use std::collections::HashSet;

use anyhow::Result;
use uuid::Uuid;

use loft_types::api::SearchParams;
use loft_types::models::Message;

use crate::{Store, Tables};

impl Store {
    /// Free-text search over the caller's messages, newest first.
    ///
    /// Matching is plain lowercase substring containment over a blob of
    /// message content, sender name and attachment metadata; an empty query
    /// matches everything in scope. A `conversation_id` filter pointing at
    /// a conversation the caller does not own yields an empty result rather
    /// than an error, so foreign ids cannot be probed.
    pub fn search_messages(&self, caller: Uuid, params: &SearchParams) -> Result<Vec<Message>> {
        self.with_tables(|tables| Ok(search(tables, caller, params)))
    }
}

fn search(tables: &Tables, caller: Uuid, params: &SearchParams) -> Vec<Message> {
    let owned: HashSet<Uuid> = tables
        .conversations
        .values()
        .filter(|c| c.user_id == caller)
        .map(|c| c.id)
        .collect();

    let scope: HashSet<Uuid> = match params.conversation_id {
        Some(id) if owned.contains(&id) => HashSet::from([id]),
        Some(_) => return Vec::new(),
        None => owned,
    };

    // A blank query is a pass-through; a non-blank query matches verbatim,
    // surrounding whitespace included.
    let needle = params.q.to_lowercase();
    let blank = needle.trim().is_empty();

    let mut matches: Vec<Message> = tables
        .messages
        .values()
        .filter(|m| scope.contains(&m.conversation_id))
        .filter(|m| blank || search_blob(m).contains(&needle))
        .cloned()
        .collect();

    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    if let Some(limit) = params.limit {
        matches.truncate(limit);
    }
    matches
}

/// Lowercase haystack for one message: content, sender name, and per
/// attachment its filename, mime type and logical kind. Blank attachment
/// fields contribute nothing.
fn search_blob(message: &Message) -> String {
    let mut blob = String::with_capacity(message.content.len() + message.sender_name.len() + 16);
    blob.push_str(&message.content);
    blob.push(' ');
    blob.push_str(&message.sender_name);
    for attachment in &message.attachments {
        for field in [
            attachment.filename.as_str(),
            attachment.mime_type.as_deref().unwrap_or(""),
            attachment.kind.as_str(),
        ] {
            if !field.is_empty() {
                blob.push(' ');
                blob.push_str(field);
            }
        }
    }
    blob.to_lowercase()
}
