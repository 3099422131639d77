//! Application state owned by the event loop.
//!
//! [`App`] aggregates the conversation store, settings and view state. It is
//! only mutated through [`apply_action`], one action at a time; background
//! work is requested by returning [`AppCommand`]s.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::conversation::ConversationStore;
use crate::core::route::Route;
use crate::core::settings::Settings;
use crate::core::storage::KeyValueStore;
use crate::ui::appearance::Appearance;
use crate::ui::theme::Theme;
use crate::utils::scroll::ScrollState;

pub mod actions;
pub mod chat;
pub mod settings_panel;
pub mod sidebar;
pub mod ui_state;


pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use chat::ChatState;
pub use settings_panel::{SettingsField, SettingsPanel};
pub use sidebar::{MenuItem, SidebarState};
pub use ui_state::{UiFocus, UiState};

pub struct AppInit {
    pub store: Arc<dyn KeyValueStore>,
    pub system_appearance: Option<Appearance>,
    /// Model for this session only; the persisted setting is untouched.
    pub model_override: Option<String>,
    pub initial_route: Route,
}

pub struct App {
    pub conversations: ConversationStore,
    pub settings: Settings,
    pub store: Arc<dyn KeyValueStore>,
    pub chat: ChatState,
    pub sidebar: SidebarState,
    pub settings_panel: Option<SettingsPanel>,
    pub ui: UiState,
    pub model_override: Option<String>,
    system_appearance: Option<Appearance>,
}

impl App {
    pub fn new(init: AppInit) -> Self {
        let conversations = ConversationStore::open(Arc::clone(&init.store));
        let settings = Settings::load(init.store.as_ref());
        let theme = Theme::for_settings(&settings, init.system_appearance);

        let mut app = App {
            conversations,
            settings,
            store: init.store,
            chat: ChatState::default(),
            sidebar: SidebarState::default(),
            settings_panel: None,
            ui: UiState::new(theme),
            model_override: init.model_override.filter(|m| !m.trim().is_empty()),
            system_appearance: init.system_appearance,
        };
        app.navigate(init.initial_route);
        app
    }

    pub fn current_model(&self) -> &str {
        self.model_override
            .as_deref()
            .unwrap_or(self.settings.model.as_str())
    }

    pub fn route(&self) -> Route {
        Route::from(self.chat.active.clone())
    }

    /// Show a conversation in full, or the empty new chat. Unknown ids
    /// resolve to the new chat. Any running reveal is dropped.
    pub fn navigate(&mut self, route: Route) {
        match route {
            Route::Conversation(id) => match self.conversations.get(&id) {
                Some(conversation) => {
                    let messages = conversation.messages.clone();
                    self.chat.show(Some(id), messages);
                }
                None => {
                    warn!(conversation = %id, "Unknown conversation; showing a new chat");
                    self.chat.show(None, Vec::new());
                }
            },
            Route::Root => self.chat.show(None, Vec::new()),
        }
        debug!(route = %self.route(), "Navigated");
        self.ui.scroll = ScrollState::default();
        self.select_active_in_sidebar();
    }

    pub fn new_chat(&mut self) {
        self.navigate(Route::Root);
        self.set_focus(UiFocus::Input);
        self.ui.clear_status();
    }

    pub fn apply_theme(&mut self) {
        let theme = Theme::for_settings(&self.settings, self.system_appearance);
        self.ui.set_theme(theme);
    }

    /// Leaving the sidebar commits an open rename and closes its menu.
    pub fn set_focus(&mut self, focus: UiFocus) {
        if self.ui.focus == UiFocus::Sidebar && focus != UiFocus::Sidebar {
            self.commit_rename();
            self.sidebar.menu = None;
        }
        self.ui.focus = focus;
    }

    pub fn toggle_focus(&mut self) {
        let next = match self.ui.focus {
            UiFocus::Input if self.ui.show_sidebar => UiFocus::Sidebar,
            _ => UiFocus::Input,
        };
        self.set_focus(next);
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.show_sidebar = !self.ui.show_sidebar;
        if !self.ui.show_sidebar {
            self.set_focus(UiFocus::Input);
        }
    }

    pub fn handle_escape(&mut self) {
        if self.settings_panel.is_some() {
            self.close_settings();
        } else if self.sidebar.rename.is_some() {
            self.cancel_rename();
        } else if self.sidebar.menu.is_some() {
            self.sidebar_close_menu();
        } else if !self.stop_reveal() && !self.cancel_pending_request() {
            self.ui.clear_status();
        }
    }
}
