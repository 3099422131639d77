use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::App;
use crate::core::completion::{CompletionError, CompletionEvent, ExchangeParams, TitleParams};
use crate::core::conversation::ConversationId;
use crate::core::message::Message;
use crate::core::route::Route;

#[derive(Debug)]
pub enum AppAction {
    SubmitInput,
    InsertIntoInput {
        text: String,
    },
    SetStatus {
        message: String,
    },
    ClearStatus,
    /// Close the topmost overlay, or stop whatever is running.
    Escape,
    CompletionReceived {
        request_id: u64,
        reply: Message,
    },
    CompletionFailed {
        request_id: u64,
        error: CompletionError,
    },
    TitleSuggested {
        conversation_id: ConversationId,
        title: String,
    },
    RevealTick {
        reveal_id: u64,
    },
    ScrollKeepAlive {
        reveal_id: u64,
    },
    NewChat,
    OpenConversation {
        id: ConversationId,
    },
    ToggleSidebar,
    ToggleFocus,
    SidebarMove {
        delta: i32,
    },
    SidebarOpenSelected,
    SidebarToggleMenu,
    SidebarCloseMenu,
    SidebarMenuMove {
        delta: i32,
    },
    SidebarMenuConfirm,
    RenameInput {
        ch: char,
    },
    RenameBackspace,
    RenameCommit,
    RenameCancel,
    OpenSettings,
    CloseSettings,
    SettingsMove {
        delta: i32,
    },
    SettingsAdjust {
        forward: bool,
    },
    ScrollUp {
        lines: u16,
    },
    ScrollDown {
        lines: u16,
    },
    PageUp,
    PageDown,
    ScrollToBottom,
    CopyLastReply,
    Quit,
}

impl From<CompletionEvent> for AppAction {
    fn from(event: CompletionEvent) -> Self {
        match event {
            CompletionEvent::Reply { request_id, reply } => {
                AppAction::CompletionReceived { request_id, reply }
            }
            CompletionEvent::Failed { request_id, error } => {
                AppAction::CompletionFailed { request_id, error }
            }
            CompletionEvent::Title {
                conversation_id,
                title,
            } => AppAction::TitleSuggested {
                conversation_id,
                title,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

impl AppActionContext {
    /// Transcript rows left after the input box and chrome.
    fn page_height(self, app: &App) -> u16 {
        self.term_height
            .saturating_sub(app.ui.input_height() + 5)
            .max(1)
    }
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, ctx: AppActionContext) -> bool {
        self.tx
            .send(AppActionEnvelope {
                action,
                context: ctx,
            })
            .is_ok()
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.dispatch(action, ctx);
        }
    }
}

/// Side effects the event loop runs on behalf of the state.
#[derive(Debug)]
pub enum AppCommand {
    SpawnExchange(ExchangeParams),
    SpawnTitle(TitleParams),
    StartRevealTimers {
        reveal_id: u64,
        cancel_token: CancellationToken,
    },
    CopyToClipboard {
        text: String,
    },
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        commands.extend(apply_action(app, envelope.action, envelope.context));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitInput => return app.submit_input(),
        AppAction::CompletionReceived { request_id, reply } => {
            return app.handle_completion_reply(request_id, reply)
        }
        AppAction::CopyLastReply => return app.copy_last_reply(),

        AppAction::InsertIntoInput { text } => app.ui.insert_into_input(&text),
        AppAction::SetStatus { message } => app.ui.set_status(message),
        AppAction::ClearStatus => app.ui.clear_status(),
        AppAction::Escape => app.handle_escape(),
        AppAction::CompletionFailed { request_id, error } => {
            app.handle_completion_failure(request_id, error)
        }
        AppAction::TitleSuggested {
            conversation_id,
            title,
        } => app.handle_title_suggestion(&conversation_id, &title),
        AppAction::RevealTick { reveal_id } => app.advance_reveal(reveal_id),
        AppAction::ScrollKeepAlive { reveal_id } => app.keep_scrolled_during_reveal(reveal_id),

        AppAction::NewChat => app.new_chat(),
        AppAction::OpenConversation { id } => app.navigate(Route::Conversation(id)),
        AppAction::ToggleSidebar => app.toggle_sidebar(),
        AppAction::ToggleFocus => app.toggle_focus(),

        AppAction::SidebarMove { delta } => app.sidebar_move(delta),
        AppAction::SidebarOpenSelected => app.sidebar_open_selected(),
        AppAction::SidebarToggleMenu => app.sidebar_toggle_menu(),
        AppAction::SidebarCloseMenu => app.sidebar_close_menu(),
        AppAction::SidebarMenuMove { delta } => app.sidebar_menu_move(delta),
        AppAction::SidebarMenuConfirm => app.sidebar_menu_confirm(),
        AppAction::RenameInput { ch } => app.rename_input(ch),
        AppAction::RenameBackspace => app.rename_backspace(),
        AppAction::RenameCommit => app.commit_rename(),
        AppAction::RenameCancel => app.cancel_rename(),

        AppAction::OpenSettings => app.open_settings(),
        AppAction::CloseSettings => app.close_settings(),
        AppAction::SettingsMove { delta } => app.settings_move(delta),
        AppAction::SettingsAdjust { forward } => app.settings_adjust(forward),

        AppAction::ScrollUp { lines } => app.ui.scroll.scroll_up(lines),
        AppAction::ScrollDown { lines } => app.ui.scroll.scroll_down(lines),
        AppAction::PageUp => {
            let page = ctx.page_height(app).saturating_sub(1).max(1);
            app.ui.scroll.scroll_up(page);
        }
        AppAction::PageDown => {
            let page = ctx.page_height(app).saturating_sub(1).max(1);
            app.ui.scroll.scroll_down(page);
        }
        AppAction::ScrollToBottom => app.ui.scroll.scroll_to_bottom(),
        AppAction::Quit => app.shutdown(),
    }
    Vec::new()
}
