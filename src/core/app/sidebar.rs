//! Conversation list: selection, the per-entry options menu, inline rename
//! and delete.

use tracing::info;

use super::App;
use crate::core::conversation::ConversationId;
use crate::core::route::Route;

const INERT_HINT: &str = "Available once the reply has finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Rename,
    Delete,
}

impl MenuItem {
    pub const ALL: [MenuItem; 2] = [MenuItem::Rename, MenuItem::Delete];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Rename => "Rename",
            MenuItem::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarMenu {
    pub conversation_id: ConversationId,
    pub highlighted: MenuItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDraft {
    pub conversation_id: ConversationId,
    pub buffer: String,
}

/// At most one menu and one rename draft exist at a time.
#[derive(Debug, Clone, Default)]
pub struct SidebarState {
    /// Index into the most-recent-first list.
    pub selected: usize,
    pub menu: Option<SidebarMenu>,
    pub rename: Option<RenameDraft>,
}

impl App {
    fn selected_conversation_id(&self) -> Option<ConversationId> {
        self.conversations
            .recent_first()
            .nth(self.sidebar.selected)
            .map(|c| c.id.clone())
    }

    pub(crate) fn select_active_in_sidebar(&mut self) {
        if let Some(active) = &self.chat.active {
            if let Some(index) = self.conversations.recent_first().position(|c| &c.id == active) {
                self.sidebar.selected = index;
            }
        }
        self.clamp_sidebar_selection();
    }

    fn clamp_sidebar_selection(&mut self) {
        let len = self.conversations.len();
        self.sidebar.selected = if len == 0 {
            0
        } else {
            self.sidebar.selected.min(len - 1)
        };
    }

    pub fn sidebar_move(&mut self, delta: i32) {
        self.commit_rename();
        self.sidebar.menu = None;
        let len = self.conversations.len();
        if len == 0 {
            return;
        }
        let current = self.sidebar.selected as i64;
        let next = (current + delta as i64).clamp(0, len as i64 - 1);
        self.sidebar.selected = next as usize;
    }

    pub fn sidebar_open_selected(&mut self) {
        self.sidebar.menu = None;
        if let Some(id) = self.selected_conversation_id() {
            self.navigate(Route::Conversation(id));
        }
    }

    /// Open the options menu on the selected entry, closing any other.
    pub fn sidebar_toggle_menu(&mut self) {
        if self.chat.is_revealing() {
            self.ui.set_status(INERT_HINT);
            return;
        }
        self.commit_rename();
        let Some(id) = self.selected_conversation_id() else {
            return;
        };
        let already_open = self
            .sidebar
            .menu
            .as_ref()
            .is_some_and(|menu| menu.conversation_id == id);
        self.sidebar.menu = if already_open {
            None
        } else {
            Some(SidebarMenu {
                conversation_id: id,
                highlighted: MenuItem::Rename,
            })
        };
    }

    pub fn sidebar_close_menu(&mut self) {
        self.sidebar.menu = None;
    }

    pub fn sidebar_menu_move(&mut self, delta: i32) {
        if let Some(menu) = self.sidebar.menu.as_mut() {
            let len = MenuItem::ALL.len() as i32;
            let current = MenuItem::ALL
                .iter()
                .position(|item| *item == menu.highlighted)
                .unwrap_or(0) as i32;
            let next = (current + delta).rem_euclid(len) as usize;
            menu.highlighted = MenuItem::ALL[next];
        }
    }

    pub fn sidebar_menu_confirm(&mut self) {
        let Some(menu) = self.sidebar.menu.take() else {
            return;
        };
        if self.chat.is_revealing() {
            self.ui.set_status(INERT_HINT);
            return;
        }
        match menu.highlighted {
            MenuItem::Rename => self.start_rename(&menu.conversation_id),
            MenuItem::Delete => self.delete_conversation(&menu.conversation_id),
        }
    }

    pub fn start_rename(&mut self, id: &ConversationId) {
        let Some(conversation) = self.conversations.get(id) else {
            return;
        };
        self.sidebar.rename = Some(RenameDraft {
            conversation_id: id.clone(),
            buffer: conversation.title.clone(),
        });
    }

    pub fn rename_input(&mut self, ch: char) {
        if let Some(draft) = self.sidebar.rename.as_mut() {
            draft.buffer.push(ch);
        }
    }

    pub fn rename_backspace(&mut self) {
        if let Some(draft) = self.sidebar.rename.as_mut() {
            draft.buffer.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        self.sidebar.rename = None;
    }

    /// Commit the rename draft, if any. A blank title keeps the old one.
    pub fn commit_rename(&mut self) {
        let Some(draft) = self.sidebar.rename.take() else {
            return;
        };
        if self.conversations.rename(&draft.conversation_id, &draft.buffer) {
            self.chat.forget_title(&draft.conversation_id);
            info!(conversation = %draft.conversation_id, "Renamed conversation");
        } else {
            self.ui.set_status("Title cannot be empty");
        }
    }

    pub fn delete_conversation(&mut self, id: &ConversationId) {
        if !self.conversations.remove(id) {
            return;
        }
        info!(conversation = %id, "Deleted conversation");
        self.chat.forget_title(id);
        if self.sidebar.rename.as_ref().is_some_and(|d| &d.conversation_id == id) {
            self.sidebar.rename = None;
        }
        if self.chat.active.as_ref() == Some(id) {
            self.navigate(Route::Root);
        }
        self.clamp_sidebar_selection();
    }
}
