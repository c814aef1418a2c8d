use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use loft_types::api::{MessagePatch, NewMessage};
use loft_types::models::Message;

use crate::{Store, preview};

impl Store {
    /// Create a message and adopt it as its conversation's preview. Never
    /// fails: the caller has already validated that the conversation exists
    /// and is theirs.
    pub fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        req: NewMessage,
    ) -> Result<Message> {
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            sender_name: req.sender_name,
            content: req.content,
            kind: req.kind,
            attachments: req.attachments,
            reply_to_id: req.reply_to_id,
            is_edited: false,
            delivered_at: None,
            read_at: None,
            created_at: now,
            updated_at: now,
        };

        self.with_tables_mut(|tables| {
            tables.messages.insert(message.id, message.clone());
            preview::set_latest(tables, &message, now);
            Ok(())
        })?;

        Ok(message)
    }

    /// Messages of an owned conversation, oldest first. `None` when the
    /// conversation is missing or foreign.
    pub fn list_messages(
        &self,
        conversation_id: Uuid,
        caller: Uuid,
    ) -> Result<Option<Vec<Message>>> {
        self.with_tables(|tables| {
            let owned = tables
                .conversations
                .get(&conversation_id)
                .is_some_and(|c| c.user_id == caller);
            if !owned {
                return Ok(None);
            }

            let mut messages: Vec<Message> = tables
                .messages
                .values()
                .filter(|m| m.conversation_id == conversation_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(Some(messages))
        })
    }

    /// Partial update. A content change marks the message edited unless the
    /// patch carries an explicit `is_edited`, and refreshes the conversation
    /// preview iff the message is the current latest.
    pub fn update_message(
        &self,
        id: Uuid,
        caller: Uuid,
        patch: MessagePatch,
    ) -> Result<Option<Message>> {
        let now = Utc::now();
        self.with_tables_mut(|tables| {
            let Some(conversation_id) = tables.messages.get(&id).map(|m| m.conversation_id) else {
                return Ok(None);
            };
            let owned = tables
                .conversations
                .get(&conversation_id)
                .is_some_and(|c| c.user_id == caller);
            if !owned {
                return Ok(None);
            }

            // Ownership checked above; the entry is still present because
            // the lock is held across the whole operation.
            let Some(message) = tables.messages.get_mut(&id) else {
                return Ok(None);
            };

            let mut content_changed = false;
            if let Some(content) = patch.content {
                content_changed = content != message.content;
                message.content = content;
            }
            match patch.is_edited {
                Some(flag) => message.is_edited = flag,
                None if content_changed => message.is_edited = true,
                None => {}
            }
            if let Some(delivered_at) = patch.delivered_at {
                message.delivered_at = Some(delivered_at);
            }
            if let Some(read_at) = patch.read_at {
                message.read_at = Some(read_at);
            }
            message.updated_at = now;

            let updated = message.clone();
            if content_changed {
                preview::refresh_after_edit(tables, &updated, now);
            }
            Ok(Some(updated))
        })
    }

    /// Delete a message, re-deriving the conversation preview when the
    /// deleted message was its source. False when missing or foreign.
    pub fn delete_message(&self, id: Uuid, caller: Uuid) -> Result<bool> {
        let now = Utc::now();
        let deleted = self.with_tables_mut(|tables| {
            let Some(conversation_id) = tables.messages.get(&id).map(|m| m.conversation_id) else {
                return Ok(false);
            };
            let owned = tables
                .conversations
                .get(&conversation_id)
                .is_some_and(|c| c.user_id == caller);
            if !owned {
                return Ok(false);
            }

            tables.messages.remove(&id);
            preview::refresh_after_delete(tables, conversation_id, id, now);
            Ok(true)
        })?;

        if deleted {
            info!("Message {} deleted", id);
        }
        Ok(deleted)
    }
}
