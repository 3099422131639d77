use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::app::sidebar::MenuItem;
use crate::core::app::{App, SettingsField, UiFocus};
use crate::core::message::Role;
use crate::ui::markdown::{render_markdown, render_plain};
use crate::ui::theme::{parse_hex_color, Theme};
use crate::utils::scroll::ScrollCalculator;

const SIDEBAR_WIDTH: u16 = 30;
const JUMP_MARKER: &str = " ↓ End ";
const THINKING: &str = "Thinking…";

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(app.ui.theme.background_color)),
        area,
    );

    let main_area = if app.ui.show_sidebar && area.width > SIDEBAR_WIDTH * 2 {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        render_sidebar(f, app, columns[0]);
        columns[1]
    } else {
        area
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(app.ui.input_height() + 2),
        ])
        .split(main_area);

    render_header(f, app, rows[0]);
    render_transcript(f, app, rows[1]);
    render_status(f, app, rows[2]);
    render_input(f, app, rows[3]);

    if app.settings_panel.is_some() {
        render_settings(f, app, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let title = app
        .chat
        .active
        .as_ref()
        .and_then(|id| app.conversations.get(id))
        .map(|c| c.title.as_str())
        .unwrap_or("New chat");
    let line = Line::from(vec![
        Span::styled(" Genie ", theme.title_style),
        Span::styled(format!("· {title} "), theme.assistant_text_style),
        Span::styled(format!("· {}", app.current_model()), theme.muted_style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Unwrapped transcript lines for the current view.
pub fn build_transcript_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.ui.theme;
    let mut lines = Vec::new();

    if app.chat.messages.is_empty() && !app.chat.is_waiting_in_view() {
        lines.push(Line::from(Span::styled(
            "Ask anything. Enter sends, Tab switches to the chat list, Ctrl+O opens settings.",
            theme.muted_style,
        )));
        return lines;
    }

    for (index, message) in app.chat.messages.iter().enumerate() {
        let text = app.chat.display_text(index).unwrap_or_default();
        match message.role {
            Role::User => {
                lines.push(Line::from(Span::styled("You", theme.user_prefix_style)));
                lines.extend(render_plain(text, theme.user_text_style));
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Genie",
                    theme.assistant_prefix_style,
                )));
                lines.extend(render_markdown(text, theme));
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_waiting_in_view() {
        lines.push(Line::from(Span::styled(THINKING, theme.status_style)));
    }
    lines
}

fn render_transcript(f: &mut Frame, app: &mut App, area: Rect) {
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    let lines = build_transcript_lines(app);
    let wrapped = ScrollCalculator::prewrap_lines(&lines, inner.width);
    let offset = app.ui.scroll.settle(wrapped.len(), inner.height);

    f.render_widget(Paragraph::new(wrapped).scroll((offset, 0)), inner);

    if !app.ui.scroll.follow_bottom && inner.height > 0 {
        let width = (JUMP_MARKER.width() as u16).min(inner.width);
        let marker_area = Rect {
            x: inner.right().saturating_sub(width),
            y: inner.bottom().saturating_sub(1),
            width,
            height: 1,
        };
        f.render_widget(
            Paragraph::new(Span::styled(JUMP_MARKER, app.ui.theme.marker_style)),
            marker_area,
        );
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let text = match &app.ui.status {
        Some(status) => status.clone(),
        None if app.chat.is_revealing() => "Esc stops the reply".to_string(),
        None if app.chat.is_waiting_in_view() => "Esc cancels the request".to_string(),
        None => String::new(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {text}"), theme.status_style)),
        area,
    );
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let border_style = if app.ui.is_input_focused() && app.settings_panel.is_none() {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Message ", border_style));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.textarea(), inner);
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let focused = app.ui.focus == UiFocus::Sidebar && app.settings_panel.is_none();
    let border_style = if focused {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(border_style)
        .title(Span::styled(" Chats ", border_style));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines = vec![Line::from(Span::styled(
        truncate_to_width("+ New chat (Ctrl+N)", width),
        theme.muted_style,
    ))];
    let mut selected_row = 0usize;

    for (index, conversation) in app.conversations.recent_first().enumerate() {
        let is_selected = index == app.sidebar.selected;
        let is_active = app.chat.active.as_ref() == Some(&conversation.id);

        let renaming = app
            .sidebar
            .rename
            .as_ref()
            .filter(|draft| draft.conversation_id == conversation.id);
        let label = match renaming {
            Some(draft) => format!("{}▏", draft.buffer),
            None => conversation.title.clone(),
        };

        let mut style = if is_active {
            theme.active_style
        } else {
            theme.assistant_text_style
        };
        if is_selected && focused {
            style = theme.selection_style;
        }
        if renaming.is_some() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        if is_selected {
            selected_row = lines.len();
        }
        lines.push(Line::from(Span::styled(
            truncate_to_width(&format!(" {label}"), width),
            style,
        )));

        if let Some(menu) = app
            .sidebar
            .menu
            .as_ref()
            .filter(|menu| menu.conversation_id == conversation.id)
        {
            for item in MenuItem::ALL {
                let item_style = if item == menu.highlighted {
                    theme.selection_style
                } else {
                    theme.muted_style
                };
                lines.push(Line::from(Span::styled(
                    format!("   {}", item.label()),
                    item_style,
                )));
            }
        }
    }

    let height = inner.height as usize;
    let offset = (selected_row + MenuItem::ALL.len() + 1).saturating_sub(height);
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    f.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}

fn render_settings(f: &mut Frame, app: &App, area: Rect) {
    let Some(panel) = app.settings_panel else {
        return;
    };
    let theme = &app.ui.theme;
    let popup = centered_popup(48, 10, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.focused_border_style)
        .title(Span::styled(" Settings ", theme.title_style))
        .style(Style::default().bg(theme.background_color));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    for field in SettingsField::ALL {
        let highlighted = field == panel.field;
        let label_style = if highlighted {
            theme.selection_style
        } else {
            theme.assistant_text_style
        };
        let mut spans = vec![Span::styled(format!(" {:<16}", field.label()), label_style)];
        spans.extend(settings_value(app, field, theme));
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " ↑/↓ select · ←/→ or Enter change · Esc close",
        theme.muted_style,
    )));

    f.render_widget(Paragraph::new(lines), inner);
}

fn settings_value(app: &App, field: SettingsField, theme: &Theme) -> Vec<Span<'static>> {
    let settings = &app.settings;
    match field {
        SettingsField::Color => {
            let swatch = parse_hex_color(&settings.selected_color)
                .map(|color| Style::default().fg(color))
                .unwrap_or(theme.muted_style);
            vec![
                Span::raw(" "),
                Span::styled("●", swatch),
                Span::styled(format!(" {}", settings.selected_color), theme.muted_style),
            ]
        }
        SettingsField::Appearance => vec![Span::styled(
            format!(" {}", settings.appearance.label()),
            theme.muted_style,
        )],
        SettingsField::Model => {
            let mut spans = vec![Span::styled(format!(" {}", settings.model), theme.muted_style)];
            if let Some(model) = &app.model_override {
                spans.push(Span::styled(
                    format!(" (session: {model})"),
                    theme.status_style,
                ));
            }
            spans
        }
        SettingsField::RestoreDefaults => Vec::new(),
    }
}

fn centered_popup(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
