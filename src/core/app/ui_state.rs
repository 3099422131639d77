use ratatui::prelude::Size;
use ratatui::style::Style;
use tui_textarea::TextArea;

use crate::ui::theme::Theme;
use crate::utils::scroll::ScrollState;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiFocus {
    Input,
    Sidebar,
}

const INPUT_PLACEHOLDER: &str = "Type a message (Enter to send, Alt+Enter for a new line)";

#[derive(Debug, Clone)]
pub struct UiState {
    pub focus: UiFocus,
    pub show_sidebar: bool,
    pub status: Option<String>,
    pub theme: Theme,
    pub scroll: ScrollState,
    pub exit_requested: bool,
    pub last_term_size: Size,
    textarea: TextArea<'static>,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        let mut ui = Self {
            focus: UiFocus::Input,
            show_sidebar: true,
            status: None,
            theme,
            scroll: ScrollState::default(),
            exit_requested: false,
            last_term_size: Size::default(),
            textarea: TextArea::default(),
        };
        ui.configure_textarea();
        ui
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.configure_textarea();
    }

    fn configure_textarea(&mut self) {
        let textarea_style = self
            .theme
            .input_text_style
            .patch(Style::default().bg(self.theme.background_color));
        self.textarea.set_style(textarea_style);
        self.textarea.set_cursor_style(self.theme.input_cursor_style);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_placeholder_text(INPUT_PLACEHOLDER);
        self.textarea.set_placeholder_style(self.theme.muted_style);
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
        self.configure_textarea();
    }

    pub fn clear_input(&mut self) {
        self.set_input_text("");
    }

    pub fn insert_into_input(&mut self, text: &str) {
        self.textarea.insert_str(text);
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
    }

    /// Rows the input box needs, capped so the transcript stays visible.
    pub fn input_height(&self) -> u16 {
        let lines = self.textarea.lines().len().max(1);
        (lines as u16).min(6)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn is_input_focused(&self) -> bool {
        self.focus == UiFocus::Input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_round_trips_multiline_text() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.set_input_text("first\nsecond");
        assert_eq!(ui.input_text(), "first\nsecond");
        assert_eq!(ui.input_height(), 2);

        ui.insert_into_input("!");
        assert_eq!(ui.input_text(), "first\nsecond!");

        ui.clear_input();
        assert_eq!(ui.input_text(), "");
        assert_eq!(ui.input_height(), 1);
    }
}
