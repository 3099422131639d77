//! Conversation records and the store that keeps them persisted.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::message::Message;
use crate::core::storage::{load_json, save_json, KeyValueStore, CHATS_KEY};

/// Title given to a conversation until a suggested one arrives.
pub const PROVISIONAL_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Random RFC 4122 version 4 identifier in hyphenated form.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: ConversationId, title: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id,
            title: title.into(),
            messages,
            created_at: Some(Utc::now()),
        }
    }
}

/// Ordered list of conversations, oldest first, mirrored to the `chats` key
/// after every mutation.
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    backend: Arc<dyn KeyValueStore>,
}

impl ConversationStore {
    /// Read the persisted list. Absent or malformed data yields an empty list.
    pub fn load_all(backend: &dyn KeyValueStore) -> Vec<Conversation> {
        let loaded: Vec<Conversation> = match load_json(backend, CHATS_KEY) {
            Ok(Some(conversations)) => conversations,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "Discarding unreadable conversation history");
                Vec::new()
            }
        };

        let mut unique: Vec<Conversation> = Vec::with_capacity(loaded.len());
        for conversation in loaded {
            if unique.iter().any(|c| c.id == conversation.id) {
                warn!(id = %conversation.id, "Dropping conversation with duplicate id");
                continue;
            }
            unique.push(conversation);
        }
        unique
    }

    pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
        let conversations = Self::load_all(backend.as_ref());
        debug!(count = conversations.len(), "Loaded conversations");
        Self {
            conversations,
            backend,
        }
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// Conversations with the most recently created first.
    pub fn recent_first(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter().rev()
    }

    /// Append one settled exchange.
    ///
    /// With an id, both messages go to that conversation (`None` if it no
    /// longer exists). Without one, a new conversation is created with the
    /// provisional title and its id is returned.
    pub fn append(
        &mut self,
        conversation_id: Option<&ConversationId>,
        user: Message,
        assistant: Message,
    ) -> Option<ConversationId> {
        let id = match conversation_id {
            Some(id) => {
                let conversation = self.conversations.iter_mut().find(|c| &c.id == id)?;
                conversation.messages.push(user);
                conversation.messages.push(assistant);
                id.clone()
            }
            None => {
                let mut id = ConversationId::generate();
                while self.contains(&id) {
                    id = ConversationId::generate();
                }
                self.conversations.push(Conversation::new(
                    id.clone(),
                    PROVISIONAL_TITLE,
                    vec![user, assistant],
                ));
                id
            }
        };
        self.persist();
        Some(id)
    }

    /// Replace a title. Blank titles are rejected.
    pub fn rename(&mut self, id: &ConversationId, new_title: &str) -> bool {
        let title = new_title.trim();
        if title.is_empty() {
            return false;
        }
        let Some(conversation) = self.conversations.iter_mut().find(|c| &c.id == id) else {
            return false;
        };
        if conversation.title != title {
            conversation.title = title.to_string();
            self.persist();
        }
        true
    }

    pub fn remove(&mut self, id: &ConversationId) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| &c.id != id);
        let removed = self.conversations.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Err(err) = save_json(self.backend.as_ref(), CHATS_KEY, &self.conversations) {
            warn!(error = %err, "Failed to persist conversations");
        }
    }
}
