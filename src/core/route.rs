//! Which conversation the chat view shows.

use std::fmt;

use crate::core::conversation::ConversationId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// A new, unsaved chat.
    #[default]
    Root,
    Conversation(ConversationId),
}

impl Route {
    /// Accepts `/`, `/{id}` or a bare id. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Route> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Some(Route::Root);
        }
        let id = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if id.is_empty() || id.contains('/') || id.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Route::Conversation(ConversationId::from(id)))
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            Route::Root => None,
            Route::Conversation(id) => Some(id),
        }
    }
}

impl From<Option<ConversationId>> for Route {
    fn from(id: Option<ConversationId>) -> Self {
        id.map_or(Route::Root, Route::Conversation)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => f.write_str("/"),
            Route::Conversation(id) => write!(f, "/{id}"),
        }
    }
}
