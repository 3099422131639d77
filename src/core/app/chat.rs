//! The send/reply cycle of the chat view.
//!
//! A send appends the user message optimistically and hands the whole
//! displayed history to the completion service. The exchange is written to
//! the store only once the reply arrives, so stored conversations always hold
//! whole user/assistant pairs. Results are matched by request id, and the
//! display is touched only if the view still shows the conversation the
//! request came from.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::actions::AppCommand;
use super::App;
use crate::core::completion::{CompletionError, ExchangeParams, TitleParams};
use crate::core::conversation::ConversationId;
use crate::core::message::Message;
use crate::core::reveal::Reveal;

const BUSY_HINT: &str = "Waiting for the reply to finish (Esc to stop)";

/// A completion request that has not settled yet.
#[derive(Debug)]
pub struct PendingExchange {
    pub request_id: u64,
    /// Conversation the request belongs to; `None` for a new chat.
    pub origin: Option<ConversationId>,
    view_epoch: u64,
    user: Message,
    cancel_token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct ChatState {
    /// Conversation on screen; `None` is the new, unsaved chat.
    pub active: Option<ConversationId>,
    /// Displayed messages, including an optimistic user message.
    pub messages: Vec<Message>,
    /// Reveal of a message that came from a live completion.
    pub reveal: Option<Reveal>,
    /// Index into `messages` the reveal applies to.
    reveal_index: usize,
    pending: Option<PendingExchange>,
    reveal_timers: Option<CancellationToken>,
    /// Conversations whose suggested title has not arrived yet.
    pending_titles: HashSet<ConversationId>,
    next_request_id: u64,
    next_reveal_id: u64,
    // Bumped on every navigation so late replies know the view moved on.
    view_epoch: u64,
}

impl ChatState {
    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.as_ref().is_some_and(Reveal::is_animating)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.is_revealing()
    }

    /// True while the outstanding request belongs to what is on screen.
    pub fn is_waiting_in_view(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.view_epoch == self.view_epoch)
    }

    pub fn awaits_title(&self, id: &ConversationId) -> bool {
        self.pending_titles.contains(id)
    }

    pub(crate) fn forget_title(&mut self, id: &ConversationId) {
        self.pending_titles.remove(id);
    }

    /// Text to draw for the message at `index`.
    pub fn display_text(&self, index: usize) -> Option<&str> {
        let message = self.messages.get(index)?;
        match &self.reveal {
            Some(reveal) if index == self.reveal_index => Some(reveal.visible_text()),
            _ => Some(message.content.as_str()),
        }
    }

    pub fn last_assistant_reply(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    pub(crate) fn cancel_reveal_timers(&mut self) {
        if let Some(token) = self.reveal_timers.take() {
            token.cancel();
        }
    }

    /// Replace the display with `messages` shown in full.
    ///
    /// Returning to the conversation an outstanding request belongs to puts
    /// its optimistic user message back and lets the reply land here.
    pub(crate) fn show(&mut self, active: Option<ConversationId>, messages: Vec<Message>) {
        self.cancel_reveal_timers();
        self.reveal = None;
        self.view_epoch += 1;
        self.active = active;
        self.messages = messages;

        let epoch = self.view_epoch;
        if let Some(pending) = self.pending.as_mut() {
            if pending.origin.is_some() && pending.origin == self.active {
                self.messages.push(pending.user.clone());
                pending.view_epoch = epoch;
            }
        }
    }

    fn take_pending(&mut self, request_id: u64) -> Option<PendingExchange> {
        match &self.pending {
            Some(pending) if pending.request_id == request_id => self.pending.take(),
            _ => None,
        }
    }

    fn allocate_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn allocate_reveal_id(&mut self) -> u64 {
        self.next_reveal_id += 1;
        self.next_reveal_id
    }
}

impl App {
    /// Send the input box contents.
    pub fn submit_input(&mut self) -> Vec<AppCommand> {
        let text = self.ui.input_text();
        if text.trim().is_empty() {
            return Vec::new();
        }
        if self.chat.is_busy() {
            self.ui.set_status(BUSY_HINT);
            return Vec::new();
        }

        let user = Message::user(text);
        self.chat.messages.push(user.clone());
        self.ui.clear_input();
        self.ui.clear_status();
        self.ui.scroll.scroll_to_bottom();

        let request_id = self.chat.allocate_request_id();
        let cancel_token = CancellationToken::new();
        let model = self.current_model().to_string();
        debug!(
            request_id,
            model = %model,
            messages = self.chat.messages.len(),
            "Submitting message"
        );

        self.chat.pending = Some(PendingExchange {
            request_id,
            origin: self.chat.active.clone(),
            view_epoch: self.chat.view_epoch,
            user,
            cancel_token: cancel_token.clone(),
        });

        vec![AppCommand::SpawnExchange(ExchangeParams {
            request_id,
            model,
            history: self.chat.messages.clone(),
            cancel_token,
        })]
    }

    pub fn handle_completion_reply(&mut self, request_id: u64, reply: Message) -> Vec<AppCommand> {
        let Some(pending) = self.chat.take_pending(request_id) else {
            debug!(request_id, "Ignoring stale completion");
            return Vec::new();
        };
        let mut commands = Vec::new();
        let shows_origin = pending.view_epoch == self.chat.view_epoch;

        match &pending.origin {
            None => {
                let Some(id) = self
                    .conversations
                    .append(None, pending.user.clone(), reply.clone())
                else {
                    return commands;
                };
                info!(conversation = %id, "Created conversation");
                self.chat.pending_titles.insert(id.clone());
                commands.push(AppCommand::SpawnTitle(TitleParams {
                    conversation_id: id.clone(),
                    first_user: pending.user.content.clone(),
                    first_assistant: reply.content.clone(),
                }));
                if shows_origin {
                    self.chat.active = Some(id);
                    self.select_active_in_sidebar();
                }
            }
            Some(id) => {
                let appended = self
                    .conversations
                    .append(Some(id), pending.user.clone(), reply.clone());
                if appended.is_none() {
                    warn!(conversation = %id, "Conversation no longer exists; reply dropped");
                    return commands;
                }
            }
        }

        if shows_origin {
            let reveal_id = self.chat.allocate_reveal_id();
            let mut reveal = Reveal::new(reveal_id, reply.content.clone());
            reveal.start();
            let animating = reveal.is_animating();
            self.chat.messages.push(reply);
            self.chat.reveal_index = self.chat.messages.len() - 1;
            self.chat.reveal = Some(reveal);
            self.ui.scroll.scroll_to_bottom();

            if animating {
                let cancel_token = CancellationToken::new();
                self.chat.reveal_timers = Some(cancel_token.clone());
                commands.push(AppCommand::StartRevealTimers {
                    reveal_id,
                    cancel_token,
                });
            }
        } else {
            debug!(request_id, "Reply stored for a conversation no longer on screen");
        }

        commands
    }

    pub fn handle_completion_failure(&mut self, request_id: u64, error: CompletionError) {
        if self.chat.take_pending(request_id).is_none() {
            debug!(request_id, error = %error, "Ignoring stale completion failure");
            return;
        }
        match error {
            CompletionError::Cancelled => self.ui.set_status("Request cancelled"),
            other => {
                warn!(request_id, error = %other, "Completion failed");
                self.ui.set_status(format!("Request failed: {other}"));
            }
        }
    }

    /// Apply a suggested title unless the user renamed or deleted the
    /// conversation first.
    pub fn handle_title_suggestion(&mut self, conversation_id: &ConversationId, title: &str) {
        if !self.chat.pending_titles.remove(conversation_id) {
            debug!(conversation = %conversation_id, "Discarding superseded title");
            return;
        }
        if self.conversations.rename(conversation_id, title) {
            debug!(conversation = %conversation_id, title, "Applied suggested title");
        }
    }

    /// Abandon the outstanding request. The optimistic user message stays.
    pub fn cancel_pending_request(&mut self) -> bool {
        let Some(pending) = self.chat.pending.take() else {
            return false;
        };
        pending.cancel_token.cancel();
        info!(request_id = pending.request_id, "Cancelled completion request");
        self.ui.set_status("Request cancelled");
        true
    }

    pub fn advance_reveal(&mut self, reveal_id: u64) {
        let Some(reveal) = self.chat.reveal.as_mut().filter(|r| r.id() == reveal_id) else {
            return;
        };
        if !reveal.is_animating() {
            return;
        }
        let state = reveal.tick();
        self.ui.scroll.scroll_to_bottom();
        if state.is_finished() {
            self.chat.cancel_reveal_timers();
        }
    }

    pub fn keep_scrolled_during_reveal(&mut self, reveal_id: u64) {
        let live = self
            .chat
            .reveal
            .as_ref()
            .is_some_and(|r| r.id() == reveal_id && r.is_animating());
        if live {
            self.ui.scroll.scroll_to_bottom();
        }
    }

    /// Freeze the running reveal at its current prefix.
    pub fn stop_reveal(&mut self) -> bool {
        let Some(reveal) = self.chat.reveal.as_mut().filter(|r| r.is_animating()) else {
            return false;
        };
        reveal.stop();
        self.chat.cancel_reveal_timers();
        true
    }

    pub fn copy_last_reply(&mut self) -> Vec<AppCommand> {
        match self.chat.last_assistant_reply() {
            Some(message) => vec![AppCommand::CopyToClipboard {
                text: message.content.clone(),
            }],
            None => {
                self.ui.set_status("No reply to copy");
                Vec::new()
            }
        }
    }

    /// Stop every background activity before the loop exits.
    pub fn shutdown(&mut self) {
        self.chat.cancel_reveal_timers();
        if let Some(pending) = self.chat.pending.take() {
            pending.cancel_token.cancel();
        }
        self.ui.exit_requested = true;
    }

    #[cfg(test)]
    pub(crate) fn reveal_timers_token(&self) -> Option<&CancellationToken> {
        self.chat.reveal_timers.as_ref()
    }
}
