//! Assistant replies are Markdown; this turns them into styled ratatui lines.
//!
//! Lines are produced unwrapped. The transcript pre-wraps them to the
//! viewport width afterwards, so a partially revealed reply renders the same
//! way as the finished one up to the reveal point.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

const CODE_INDENT: &str = "  ";
const QUOTE_PREFIX: &str = "│ ";
const RULE: &str = "────────────────────────";

pub fn render_markdown(content: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut renderer = MarkdownRenderer::new(theme);
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for event in Parser::new_ext(content, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// Plain text split into lines with a single style. Used for user messages,
/// which are shown exactly as typed.
pub fn render_plain(content: &str, style: Style) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

struct MarkdownRenderer<'t> {
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next ordinal for each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    code_block: Option<Option<String>>,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t Theme) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.assistant_text_style],
            lists: Vec::new(),
            quote_depth: 0,
            code_block: None,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or(self.theme.assistant_text_style)
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block.is_some() {
                    self.push_code_text(&text);
                } else {
                    let style = self.style();
                    self.current.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                let style = self.theme.code_style;
                self.current.push(Span::styled(code.into_string(), style));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let style = self.theme.muted_style;
                for (i, part) in html.split('\n').enumerate() {
                    if i > 0 {
                        self.flush_line();
                    }
                    if !part.is_empty() {
                        self.current.push(Span::styled(part.to_string(), style));
                    }
                }
            }
            Event::SoftBreak => {
                let style = self.style();
                self.current.push(Span::styled(" ", style));
            }
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines
                    .push(Line::from(Span::styled(RULE, self.theme.muted_style)));
                self.blank_line();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current
                    .push(Span::styled(marker, self.theme.muted_style));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let mut style = self.theme.title_style;
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.styles.push(style);
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } => self.push_modifier(Modifier::UNDERLINED),
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(lang.trim().to_string())
                    }
                    _ => None,
                };
                if let Some(lang) = &language {
                    self.lines.push(Line::from(Span::styled(
                        format!("{CODE_INDENT}{lang}"),
                        self.theme.muted_style,
                    )));
                }
                self.code_block = Some(language);
            }
            Tag::List(start) => {
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{marker}", "  ".repeat(depth)),
                    self.theme.assistant_prefix_style,
                ));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                self.push_modifier(Modifier::ITALIC);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush_line();
                self.blank_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            TagEnd::CodeBlock => {
                self.flush_line();
                self.code_block = None;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn push_code_text(&mut self, text: &str) {
        let style = self.theme.code_style;
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            let is_last = parts.peek().is_none();
            if is_last && part.is_empty() {
                break;
            }
            if self.current.is_empty() {
                self.current.push(Span::raw(CODE_INDENT));
            }
            self.current.push(Span::styled(part.to_string(), style));
            if !is_last {
                self.flush_line();
            }
        }
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                QUOTE_PREFIX.repeat(self.quote_depth),
                self.theme.muted_style,
            ));
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn render(content: &str) -> Vec<String> {
        render_markdown(content, &Theme::dark_default())
            .iter()
            .map(text_of)
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        assert_eq!(render("one\ntwo\n\nthree"), vec!["one two", "", "three"]);
    }

    #[test]
    fn lists_get_markers_and_numbers() {
        assert_eq!(
            render("- a\n- b\n\n3. x\n4. y"),
            vec!["• a", "• b", "", "3. x", "4. y"]
        );
    }

    #[test]
    fn nested_lists_are_indented() {
        assert_eq!(render("- a\n  - b"), vec!["• a", "  • b"]);
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = render("```rust\nfn main() {\n    run();\n}\n```\nafter");
        assert_eq!(
            lines,
            vec!["  rust", "  fn main() {", "      run();", "  }", "", "after"]
        );
    }

    #[test]
    fn inline_styles_are_applied() {
        let theme = Theme::dark_default();
        let lines = render_markdown("a **b** `c`", &theme);
        let spans = &lines[0].spans;
        assert!(spans
            .iter()
            .any(|s| s.content == "b" && s.style.add_modifier.contains(Modifier::BOLD)));
        assert!(spans
            .iter()
            .any(|s| s.content == "c" && s.style == theme.code_style));
    }

    #[test]
    fn quotes_are_prefixed() {
        assert_eq!(render("> quoted"), vec!["│ quoted"]);
    }

    #[test]
    fn unfinished_markdown_still_renders() {
        assert_eq!(render("**bol"), vec!["**bol"]);
        assert_eq!(render("```\ncode"), vec!["  code"]);
    }

    #[test]
    fn plain_text_keeps_markdown_characters() {
        let lines = render_plain("# not a heading\n*x*", Style::default());
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["# not a heading", "*x*"]);
    }
}
