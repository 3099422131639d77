use ratatui::style::{Color, Modifier, Style};

use crate::core::settings::{AppearanceMode, Settings, DEFAULT_COLOR};
use crate::ui::appearance::Appearance;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    pub accent: Color,
    pub appearance: Appearance,

    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub code_style: Style,

    // Chrome
    pub title_style: Style,
    pub border_style: Style,
    pub focused_border_style: Style,
    pub selection_style: Style,
    pub active_style: Style,
    pub muted_style: Style,
    pub status_style: Style,
    pub marker_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Self::build(Appearance::Dark, parse_hex_color(DEFAULT_COLOR).unwrap_or(Color::Magenta))
    }

    pub fn light() -> Self {
        Self::build(Appearance::Light, parse_hex_color(DEFAULT_COLOR).unwrap_or(Color::Magenta))
    }

    /// Resolve the persisted appearance (falling back to dark when the
    /// platform gives no hint) and apply the accent color.
    pub fn for_settings(settings: &Settings, system: Option<Appearance>) -> Self {
        let appearance = match settings.appearance {
            AppearanceMode::Dark => Appearance::Dark,
            AppearanceMode::Light => Appearance::Light,
            AppearanceMode::System => system.unwrap_or(Appearance::Dark),
        };
        let accent = parse_hex_color(&settings.selected_color)
            .or_else(|| parse_hex_color(DEFAULT_COLOR))
            .unwrap_or(Color::Magenta);
        Self::build(appearance, accent)
    }

    fn build(appearance: Appearance, accent: Color) -> Self {
        let (background, text, muted, subtle) = match appearance {
            Appearance::Dark => (
                Color::Rgb(0x12, 0x12, 0x16),
                Color::Rgb(0xe5, 0xe7, 0xeb),
                Color::Rgb(0x8b, 0x8f, 0x99),
                Color::Rgb(0x2a, 0x2a, 0x33),
            ),
            Appearance::Light => (
                Color::Rgb(0xfa, 0xfa, 0xfa),
                Color::Rgb(0x1f, 0x29, 0x37),
                Color::Rgb(0x6b, 0x72, 0x80),
                Color::Rgb(0xe5, 0xe7, 0xeb),
            ),
        };

        Theme {
            background_color: background,
            accent,
            appearance,

            user_prefix_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(accent),
            assistant_prefix_style: Style::default().fg(muted).add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(text),
            code_style: Style::default().fg(text).bg(subtle),

            title_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            border_style: Style::default().fg(muted),
            focused_border_style: Style::default().fg(accent),
            selection_style: Style::default().fg(background).bg(accent),
            active_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            muted_style: Style::default().fg(muted),
            status_style: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            marker_style: Style::default().fg(background).bg(accent),

            input_text_style: Style::default().fg(text),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }
}

/// `#rgb` or `#rrggbb`.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    if hex.len() == 3 {
        let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
        let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
        let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}
