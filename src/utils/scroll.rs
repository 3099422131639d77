use ratatui::{style::Style, text::Line, text::Span};
use unicode_width::UnicodeWidthChar;

/// Transcript scroll position.
///
/// `follow_bottom` is true while the user sits at the bottom of the
/// transcript; the renderer then pins `offset` to the maximum on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: u16,
    pub follow_bottom: bool,
    /// Largest offset seen by the last render.
    pub max_offset: u16,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            follow_bottom: true,
            max_offset: 0,
        }
    }
}

impl ScrollState {
    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.offset = self.max_offset;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if lines == 0 {
            return;
        }
        self.follow_bottom = false;
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset);
        if self.offset >= self.max_offset {
            self.follow_bottom = true;
        }
    }

    /// Reconcile with the line count of the frame being drawn. Returns the
    /// offset to render at.
    pub fn settle(&mut self, total_lines: usize, viewport_height: u16) -> u16 {
        self.max_offset = ScrollCalculator::max_scroll_offset(total_lines, viewport_height);
        if self.follow_bottom || self.offset >= self.max_offset {
            self.offset = self.max_offset;
            self.follow_bottom = true;
        }
        self.offset
    }
}

/// Handles all scroll-related calculations and line building
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Pre-wrap the given lines to a specific width, preserving styles and
    /// wrapping at word boundaries (long tokens are broken when needed).
    /// Rendering without ratatui's own wrapping keeps line counts exact.
    pub fn prewrap_lines(lines: &[Line], terminal_width: u16) -> Vec<Line<'static>> {
        let width = terminal_width as usize;
        let mut out: Vec<Line<'static>> = Vec::with_capacity(lines.len());

        for line in lines {
            if line.spans.is_empty() {
                out.push(Line::from(""));
                continue;
            }
            if width == 0 {
                out.push(owned_line(line));
                continue;
            }

            let mut wrapper = LineWrapper::new(width);
            for span in &line.spans {
                for ch in span.content.chars() {
                    if ch == ' ' {
                        wrapper.flush_word(&mut out);
                        wrapper.push_space(span.style, &mut out);
                    } else {
                        wrapper.push_word_char(ch, span.style);
                    }
                }
            }
            wrapper.finish(&mut out);
        }

        out
    }

    pub fn max_scroll_offset(total_lines: usize, available_height: u16) -> u16 {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        total.saturating_sub(available_height)
    }
}

fn owned_line(line: &Line) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .spans
        .iter()
        .map(|s| Span::styled(s.content.to_string(), s.style))
        .collect();
    Line::from(spans)
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

struct LineWrapper {
    width: usize,
    spans: Vec<Span<'static>>,
    len: usize,
    emitted_any: bool,
    // Current word as styled segments.
    word: Vec<(String, Style)>,
    word_len: usize,
}

impl LineWrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            spans: Vec::new(),
            len: 0,
            emitted_any: false,
            word: Vec::new(),
            word_len: 0,
        }
    }

    fn emit(&mut self, out: &mut Vec<Line<'static>>) {
        out.push(Line::from(std::mem::take(&mut self.spans)));
        self.len = 0;
        self.emitted_any = true;
    }

    fn append(&mut self, style: Style, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.style == style {
                let combined = format!("{}{}", last.content, text);
                *last = Span::styled(combined, style);
                return;
            }
        }
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn push_word_char(&mut self, ch: char, style: Style) {
        match self.word.last_mut() {
            Some((text, last_style)) if *last_style == style => text.push(ch),
            _ => self.word.push((ch.to_string(), style)),
        }
        self.word_len += char_width(ch);
    }

    fn push_space(&mut self, style: Style, out: &mut Vec<Line<'static>>) {
        if self.len < self.width {
            self.append(style, " ");
            self.len += 1;
        } else {
            // Wrap and drop the space that would lead the next line.
            self.emit(out);
        }
    }

    fn flush_word(&mut self, out: &mut Vec<Line<'static>>) {
        if self.word.is_empty() {
            return;
        }
        if self.len > 0 && self.len + self.word_len > self.width {
            self.emit(out);
        }
        for (text, style) in std::mem::take(&mut self.word) {
            let mut run = String::new();
            for ch in text.chars() {
                let w = char_width(ch);
                if self.len + w > self.width && self.len > 0 {
                    self.append(style, &std::mem::take(&mut run));
                    self.emit(out);
                }
                run.push(ch);
                self.len += w;
            }
            self.append(style, &run);
        }
        self.word_len = 0;
    }

    fn finish(mut self, out: &mut Vec<Line<'static>>) {
        self.flush_word(out);
        if !self.spans.is_empty() {
            self.emit(out);
        }
        if !self.emitted_any {
            // Keep one visual line for whitespace-only input.
            out.push(Line::from(""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = vec![Line::from("the quick brown fox jumps")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 10);
        assert_eq!(texts(&wrapped), vec!["the quick ", "brown fox ", "jumps"]);
    }

    #[test]
    fn breaks_tokens_longer_than_width() {
        let lines = vec![Line::from("abcdefghij")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 4);
        assert_eq!(texts(&wrapped), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wide_characters_count_double() {
        let lines = vec![Line::from("日本語テキスト")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 6);
        assert_eq!(texts(&wrapped), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn keeps_styles_and_empty_lines() {
        let red = Style::default().fg(Color::Red);
        let lines = vec![
            Line::from(vec![Span::styled("red", red), Span::raw(" plain")]),
            Line::from(""),
            Line::from("   "),
        ];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 40);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[0].spans[0].style, red);
        assert_eq!(texts(&wrapped)[0], "red plain");
    }

    #[test]
    fn settle_pins_offset_while_following() {
        let mut scroll = ScrollState::default();
        assert_eq!(scroll.settle(30, 10), 20);

        scroll.scroll_up(5);
        assert!(!scroll.follow_bottom);
        assert_eq!(scroll.settle(40, 10), 15);

        scroll.scroll_down(100);
        assert!(scroll.follow_bottom);
        assert_eq!(scroll.settle(50, 10), 40);
    }

    #[test]
    fn short_transcripts_never_scroll() {
        let mut scroll = ScrollState::default();
        assert_eq!(scroll.settle(3, 10), 0);
        scroll.scroll_up(2);
        assert_eq!(scroll.settle(3, 10), 0);
        assert!(scroll.follow_bottom);
    }
}
