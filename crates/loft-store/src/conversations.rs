use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use loft_types::api::{ConversationPatch, NewConversation};
use loft_types::models::Conversation;

use crate::Store;

impl Store {
    pub fn create_conversation(&self, owner: Uuid, req: NewConversation) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: owner,
            kind: req.kind,
            name: req.name,
            participants: req.participants,
            last_message_id: None,
            last_message_at: None,
            last_message_preview: String::new(),
            unread_count: 0,
            is_pinned: false,
            is_muted: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        self.with_tables_mut(|tables| {
            tables
                .conversations
                .insert(conversation.id, conversation.clone());
            Ok(())
        })?;

        info!("Conversation {} created for user {}", conversation.id, owner);
        Ok(conversation)
    }

    /// Returns `None` both when the conversation does not exist and when the
    /// caller is not its owner, so a caller cannot probe for foreign ids.
    pub fn get_conversation(&self, id: Uuid, caller: Uuid) -> Result<Option<Conversation>> {
        self.with_tables(|tables| {
            Ok(tables
                .conversations
                .get(&id)
                .filter(|c| c.user_id == caller)
                .cloned())
        })
    }

    /// The caller's conversations, most recent activity first.
    pub fn list_conversations(&self, caller: Uuid) -> Result<Vec<Conversation>> {
        self.with_tables(|tables| {
            let mut conversations: Vec<Conversation> = tables
                .conversations
                .values()
                .filter(|c| c.user_id == caller)
                .cloned()
                .collect();
            conversations.sort_by(|a, b| {
                let a_at = a.last_message_at.unwrap_or(a.updated_at);
                let b_at = b.last_message_at.unwrap_or(b.updated_at);
                b_at.cmp(&a_at).then(b.id.cmp(&a.id))
            });
            Ok(conversations)
        })
    }

    /// Direct field updates. Derived preview fields are not patchable here;
    /// they only move through the message lifecycle.
    pub fn update_conversation(
        &self,
        id: Uuid,
        caller: Uuid,
        patch: ConversationPatch,
    ) -> Result<Option<Conversation>> {
        self.with_tables_mut(|tables| {
            let Some(conversation) = tables
                .conversations
                .get_mut(&id)
                .filter(|c| c.user_id == caller)
            else {
                return Ok(None);
            };

            if let Some(name) = patch.name {
                conversation.name = name;
            }
            if let Some(participants) = patch.participants {
                conversation.participants = participants;
            }
            if let Some(unread_count) = patch.unread_count {
                conversation.unread_count = unread_count;
            }
            if let Some(is_pinned) = patch.is_pinned {
                conversation.is_pinned = is_pinned;
            }
            if let Some(is_muted) = patch.is_muted {
                conversation.is_muted = is_muted;
            }
            if let Some(is_archived) = patch.is_archived {
                conversation.is_archived = is_archived;
            }
            conversation.updated_at = Utc::now();

            Ok(Some(conversation.clone()))
        })
    }

    /// Deletes a conversation and every message in it. Returns false when
    /// the conversation is missing or owned by someone else.
    pub fn delete_conversation(&self, id: Uuid, caller: Uuid) -> Result<bool> {
        let removed = self.with_tables_mut(|tables| {
            let owned = tables
                .conversations
                .get(&id)
                .is_some_and(|c| c.user_id == caller);
            if !owned {
                return Ok(0);
            }

            tables.conversations.remove(&id);
            let before = tables.messages.len();
            tables.messages.retain(|_, m| m.conversation_id != id);
            Ok(before - tables.messages.len() + 1)
        })?;

        if removed > 0 {
            info!(
                "Conversation {} deleted with {} message(s)",
                id,
                removed - 1
            );
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loft_types::api::NewMessage;
    use loft_types::models::ConversationKind;

    fn new_conversation() -> NewConversation {
        NewConversation {
            kind: ConversationKind::Direct,
            name: "general".into(),
            participants: vec![],
        }
    }

    #[test]
    fn create_then_get_roundtrip() {
        let store = Store::new();
        let owner = Uuid::new_v4();
        let created = store.create_conversation(owner, new_conversation()).unwrap();

        let fetched = store.get_conversation(created.id, owner).unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "general");
        assert_eq!(fetched.last_message_id, None);
        assert_eq!(fetched.last_message_preview, "");
    }

    #[test]
    fn foreign_caller_sees_nothing() {
        let store = Store::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let created = store.create_conversation(owner, new_conversation()).unwrap();

        // Missing id and foreign id are indistinguishable.
        assert!(store.get_conversation(created.id, stranger).unwrap().is_none());
        assert!(store.get_conversation(Uuid::new_v4(), owner).unwrap().is_none());
        assert!(!store.delete_conversation(created.id, stranger).unwrap());
        assert!(store
            .update_conversation(created.id, stranger, ConversationPatch::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn patch_updates_fields_and_advances_updated_at() {
        let store = Store::new();
        let owner = Uuid::new_v4();
        let created = store.create_conversation(owner, new_conversation()).unwrap();

        let patch = ConversationPatch {
            name: Some("renamed".into()),
            is_pinned: Some(true),
            unread_count: Some(3),
            ..Default::default()
        };
        let updated = store
            .update_conversation(created.id, owner, patch)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert!(updated.is_pinned);
        assert_eq!(updated.unread_count, 3);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn delete_cascades_messages() {
        let store = Store::new();
        let owner = Uuid::new_v4();
        let conversation = store.create_conversation(owner, new_conversation()).unwrap();
        for i in 0..3 {
            store
                .create_message(
                    conversation.id,
                    owner,
                    NewMessage {
                        content: format!("msg {i}"),
                        kind: Default::default(),
                        attachments: vec![],
                        reply_to_id: None,
                        sender_name: "alice".into(),
                    },
                )
                .unwrap();
        }

        assert!(store.delete_conversation(conversation.id, owner).unwrap());
        store
            .with_tables(|tables| {
                assert!(tables.conversations.is_empty());
                assert!(tables.messages.is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn list_is_scoped_and_ordered_by_activity() {
        let store = Store::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let first = store.create_conversation(alice, new_conversation()).unwrap();
        let second = store.create_conversation(alice, new_conversation()).unwrap();
        store.create_conversation(bob, new_conversation()).unwrap();

        // A message in `first` makes it the most recently active.
        store
            .create_message(
                first.id,
                alice,
                NewMessage {
                    content: "bump".into(),
                    kind: Default::default(),
                    attachments: vec![],
                    reply_to_id: None,
                    sender_name: "alice".into(),
                },
            )
            .unwrap();

        let listed = store.list_conversations(alice).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }
}
