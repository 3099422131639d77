//! Event polling, dispatching, and UI rendering loop.
//!
//! The loop owns the [`App`] outright. Keys are resolved and applied in the
//! order they arrive; completion results and timer ticks come back through
//! the action channel and are drained once per iteration. Commands returned
//! by the state are turned into background tasks here.

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::prelude::Size;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::app::{
    apply_action, apply_actions, App, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
use crate::core::completion::{CompletionBackend, CompletionEvent, CompletionService};
use crate::ui::renderer::ui;
use crate::utils::clipboard::copy_to_clipboard;

use super::keybindings::{resolve_key, KeyContext, KeyResult};
use super::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use super::timers::spawn_reveal_timers;

const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// Turns [`AppCommand`]s into background work.
pub struct CommandRunner {
    service: CompletionService,
    dispatcher: AppActionDispatcher,
}

impl CommandRunner {
    pub fn new(service: CompletionService, dispatcher: AppActionDispatcher) -> Self {
        Self {
            service,
            dispatcher,
        }
    }

    pub fn run_all(&self, commands: impl IntoIterator<Item = AppCommand>) {
        for command in commands {
            self.run(command);
        }
    }

    fn run(&self, command: AppCommand) {
        match command {
            AppCommand::SpawnExchange(params) => self.service.spawn_exchange(params),
            AppCommand::SpawnTitle(params) => self.service.spawn_title(params),
            AppCommand::StartRevealTimers {
                reveal_id,
                cancel_token,
            } => {
                spawn_reveal_timers(&self.dispatcher, reveal_id, cancel_token);
            }
            AppCommand::CopyToClipboard { text } => {
                spawn_clipboard_copy(self.dispatcher.clone(), text)
            }
        }
    }
}

fn spawn_clipboard_copy(dispatcher: AppActionDispatcher, text: String) {
    tokio::task::spawn_blocking(move || {
        let message = match copy_to_clipboard(&text) {
            Ok(()) => "Copied the last reply".to_string(),
            Err(err) => {
                warn!(error = %err, "Clipboard copy failed");
                format!("Copy failed: {err}")
            }
        };
        dispatcher.dispatch(AppAction::SetStatus { message }, AppActionContext::default());
    });
}

fn context_for(size: Size) -> AppActionContext {
    AppActionContext {
        term_width: size.width,
        term_height: size.height,
    }
}

fn try_draw_frame(
    app: &mut App,
    terminal: &mut ChatTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> std::io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

fn process_ui_events(
    app: &mut App,
    runner: &CommandRunner,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    term_size: Size,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };
    let ctx = context_for(term_size);

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                route_keyboard_event(app, runner, key, ctx);
                if app.ui.exit_requested {
                    break;
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => handle_paste_event(app, &text, ctx),
            UiEvent::Crossterm(_) => {}
        }
    }

    outcome.request_redraw = outcome.events_processed;
    outcome
}

pub(crate) fn route_keyboard_event(
    app: &mut App,
    runner: &CommandRunner,
    key: KeyEvent,
    ctx: AppActionContext,
) {
    let context = KeyContext::from_app(app);
    match resolve_key(context, &key) {
        KeyResult::Actions(actions) => {
            for action in actions {
                let commands = apply_action(app, action, ctx);
                runner.run_all(commands);
            }
        }
        KeyResult::EditInput => app.ui.apply_textarea_edit(|ta| {
            ta.input(tui_textarea::Input::from(key));
        }),
        KeyResult::NotHandled => {}
    }
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

fn handle_paste_event(app: &mut App, text: &str, ctx: AppActionContext) {
    if KeyContext::from_app(app) != KeyContext::Input {
        return;
    }
    let sanitized = sanitize_pasted_text(text);
    if sanitized.is_empty() {
        return;
    }
    apply_action(app, AppAction::InsertIntoInput { text: sanitized }, ctx);
}

/// Forward finished completions into the action queue.
fn process_completion_events(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<CompletionEvent>,
    ctx: AppActionContext,
) -> bool {
    let mut received_any = false;
    while let Ok(event) = rx.try_recv() {
        received_any = true;
        dispatcher.dispatch(AppAction::from(event), ctx);
    }
    received_any
}

pub(crate) fn drain_action_queue(
    app: &mut App,
    runner: &CommandRunner,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = apply_actions(app, pending);
    runner.run_all(commands);
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

async fn event_loop(
    app: &mut App,
    terminal: &mut ChatTerminal,
    runner: &CommandRunner,
    dispatcher: &AppActionDispatcher,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
    completion_rx: &mut mpsc::UnboundedReceiver<CompletionEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn Error>> {
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    loop {
        if app.ui.exit_requested {
            return Ok(());
        }

        try_draw_frame(
            app,
            terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )?;

        let term_size = terminal.size().unwrap_or_default();
        if term_size != app.ui.last_term_size {
            app.ui.last_term_size = term_size;
            request_redraw = true;
        }

        let event_outcome = process_ui_events(app, runner, event_rx, term_size);
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        let received_any = process_completion_events(dispatcher, completion_rx, context_for(term_size));

        if drain_action_queue(app, runner, action_rx) {
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}

/// Run the interactive interface until the user quits.
pub async fn run_chat(
    mut app: App,
    backend: Arc<dyn CompletionBackend>,
    title_model: String,
) -> Result<(), Box<dyn Error>> {
    let (service, mut completion_rx) = CompletionService::new(backend, title_model);
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let runner = CommandRunner::new(service, dispatcher.clone());

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);
    info!(route = %app.route(), model = %app.current_model(), "Chat started");

    let result = event_loop(
        &mut app,
        &mut terminal,
        &runner,
        &dispatcher,
        &mut action_rx,
        &mut completion_rx,
        &mut event_rx,
    )
    .await;

    app.shutdown();
    event_reader_handle.abort();
    let restored = restore_terminal(&mut terminal);
    debug!("Terminal restored");
    if let Err(err) = &result {
        warn!(error = %err, "Chat loop ended with an error");
    }
    info!("Chat ended");
    result.and(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::completion::testing::ScriptedBackend;
    use crate::utils::test_utils::{create_test_app, TEST_CONTEXT};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    struct Harness {
        runner: CommandRunner,
        dispatcher: AppActionDispatcher,
        action_rx: mpsc::UnboundedReceiver<AppActionEnvelope>,
        completion_rx: mpsc::UnboundedReceiver<CompletionEvent>,
    }

    fn harness(replies: &[&str]) -> Harness {
        let backend = Arc::new(ScriptedBackend::replying(replies));
        let (service, completion_rx) = CompletionService::new(backend, "title-model");
        let (tx, action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(tx);
        Harness {
            runner: CommandRunner::new(service, dispatcher.clone()),
            dispatcher,
            action_rx,
            completion_rx,
        }
    }

    fn press(app: &mut App, runner: &CommandRunner, code: KeyCode) {
        route_keyboard_event(
            app,
            runner,
            KeyEvent::new(code, KeyModifiers::NONE),
            TEST_CONTEXT,
        );
    }

    async fn deliver_next_completion(app: &mut App, h: &mut Harness) {
        let event = tokio::time::timeout(Duration::from_secs(5), h.completion_rx.recv())
            .await
            .expect("completion in time")
            .expect("completion channel open");
        h.dispatcher.dispatch(AppAction::from(event), TEST_CONTEXT);
        drain_action_queue(app, &h.runner, &mut h.action_rx);
    }

    #[test]
    fn pasted_text_is_sanitized() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\td\u{7}"), "a\nb\nc    d");
    }

    #[tokio::test]
    async fn typed_keys_reach_the_input_in_order() {
        let mut app = create_test_app();
        let h = harness(&[]);
        for ch in "hi".chars() {
            press(&mut app, &h.runner, KeyCode::Char(ch));
        }
        press(&mut app, &h.runner, KeyCode::Backspace);
        assert_eq!(app.ui.input_text(), "h");
    }

    #[tokio::test]
    async fn paste_is_ignored_outside_the_input() {
        let mut app = create_test_app();
        handle_paste_event(&mut app, "pasted", TEST_CONTEXT);
        assert_eq!(app.ui.input_text(), "pasted");

        app.open_settings();
        handle_paste_event(&mut app, " more", TEST_CONTEXT);
        assert_eq!(app.ui.input_text(), "pasted");
    }

    #[tokio::test]
    async fn exchange_and_title_flow_through_the_queue() {
        let mut app = create_test_app();
        let mut h = harness(&["Hello there", "\"Friendly Greeting\""]);

        app.ui.set_input_text("Hi");
        press(&mut app, &h.runner, KeyCode::Enter);
        assert_eq!(app.chat.messages.len(), 1);

        deliver_next_completion(&mut app, &mut h).await;
        assert_eq!(app.conversations.len(), 1);
        assert!(app.chat.is_revealing());

        deliver_next_completion(&mut app, &mut h).await;
        let id = app.chat.active.clone().expect("active conversation");
        assert_eq!(
            app.conversations.get(&id).map(|c| c.title.as_str()),
            Some("Friendly Greeting")
        );

        app.shutdown();
    }

    #[tokio::test]
    async fn reveal_timers_complete_the_reply() {
        let mut app = create_test_app();
        let mut h = harness(&["short", "Title"]);

        app.ui.set_input_text("Hi");
        press(&mut app, &h.runner, KeyCode::Enter);
        deliver_next_completion(&mut app, &mut h).await;

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.chat.is_revealing() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drain_action_queue(&mut app, &h.runner, &mut h.action_rx);
        }
        assert!(!app.chat.is_revealing());
        assert_eq!(app.chat.display_text(1), Some("short"));
    }

    #[tokio::test]
    async fn escape_during_request_discards_the_late_result() {
        let mut app = create_test_app();
        let mut h = harness(&["ignored"]);

        app.ui.set_input_text("Hi");
        press(&mut app, &h.runner, KeyCode::Enter);
        press(&mut app, &h.runner, KeyCode::Esc);

        deliver_next_completion(&mut app, &mut h).await;
        assert!(app.conversations.is_empty());
        assert_eq!(app.chat.messages.len(), 1);
    }
}
