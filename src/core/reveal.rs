//! Progressive, character-by-character display of a finished reply.
//!
//! A [`Reveal`] owns the full text and a cursor measured in grapheme
//! clusters, so every visible prefix is valid text even for combining marks
//! and emoji. The clock lives outside: each call to [`Reveal::tick`] shows
//! one more character.

use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

/// Interval between revealed characters.
pub const REVEAL_TICK: Duration = Duration::from_millis(8);

/// Interval of the scroll keep-alive while a reveal is running.
pub const SCROLL_KEEPALIVE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing,
    Complete,
    /// Stopped mid-way; the visible prefix stays frozen.
    Interrupted,
}

impl RevealState {
    pub fn is_finished(self) -> bool {
        matches!(self, RevealState::Complete | RevealState::Interrupted)
    }
}

#[derive(Debug, Clone)]
pub struct Reveal {
    id: u64,
    text: String,
    // Byte offset at the end of each grapheme.
    boundaries: Vec<usize>,
    shown: usize,
    state: RevealState,
}

impl Reveal {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        let text = text.into();
        let boundaries = text
            .grapheme_indices(true)
            .map(|(offset, grapheme)| offset + grapheme.len())
            .collect();
        Self {
            id,
            text,
            boundaries,
            shown: 0,
            state: RevealState::Idle,
        }
    }

    /// A reveal that starts fully shown, for messages loaded from history.
    pub fn complete(id: u64, text: impl Into<String>) -> Self {
        let mut reveal = Self::new(id, text);
        reveal.shown = reveal.boundaries.len();
        reveal.state = RevealState::Complete;
        reveal
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_animating(&self) -> bool {
        self.state == RevealState::Revealing
    }

    pub fn start(&mut self) {
        if self.state != RevealState::Idle {
            return;
        }
        self.state = if self.boundaries.is_empty() {
            RevealState::Complete
        } else {
            RevealState::Revealing
        };
    }

    /// Show one more character. Returns the state after the step.
    pub fn tick(&mut self) -> RevealState {
        if self.state != RevealState::Revealing {
            return self.state;
        }
        if self.shown < self.boundaries.len() {
            self.shown += 1;
        }
        if self.shown == self.boundaries.len() {
            self.state = RevealState::Complete;
        }
        self.state
    }

    /// Freeze the reveal at its current prefix.
    pub fn stop(&mut self) {
        if self.state == RevealState::Revealing {
            self.state = RevealState::Interrupted;
        }
    }

    /// Characters currently shown.
    pub fn visible_len(&self) -> usize {
        self.shown
    }

    pub fn total_len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn visible_text(&self) -> &str {
        match self.shown {
            0 => "",
            n => &self.text[..self.boundaries[n - 1]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(reveal: &mut Reveal) -> Vec<usize> {
        let mut lengths = vec![reveal.visible_len()];
        while reveal.tick() == RevealState::Revealing {
            lengths.push(reveal.visible_len());
        }
        lengths.push(reveal.visible_len());
        lengths
    }

    #[test]
    fn idle_reveal_does_not_advance() {
        let mut reveal = Reveal::new(1, "hello");
        assert_eq!(reveal.tick(), RevealState::Idle);
        assert_eq!(reveal.visible_text(), "");
    }

    #[test]
    fn prefix_grows_monotonically_to_full_text() {
        let mut reveal = Reveal::new(1, "Hello, world");
        reveal.start();
        let lengths = run_to_end(&mut reveal);

        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
        assert!(lengths.iter().all(|&len| len <= reveal.total_len()));
        assert_eq!(reveal.state(), RevealState::Complete);
        assert_eq!(reveal.visible_text(), "Hello, world");
    }

    #[test]
    fn one_character_per_tick() {
        let mut reveal = Reveal::new(1, "abc");
        reveal.start();
        reveal.tick();
        assert_eq!(reveal.visible_text(), "a");
        reveal.tick();
        assert_eq!(reveal.visible_text(), "ab");
        assert_eq!(reveal.tick(), RevealState::Complete);
        assert_eq!(reveal.tick(), RevealState::Complete);
        assert_eq!(reveal.visible_text(), "abc");
    }

    #[test]
    fn stop_freezes_a_strict_prefix() {
        let mut reveal = Reveal::new(1, "interrupt me");
        reveal.start();
        for _ in 0..4 {
            reveal.tick();
        }
        reveal.stop();

        assert_eq!(reveal.state(), RevealState::Interrupted);
        assert_eq!(reveal.tick(), RevealState::Interrupted);
        assert_eq!(reveal.visible_text(), "inte");
        assert!(reveal.text().starts_with(reveal.visible_text()));
        assert!(reveal.visible_len() < reveal.total_len());
    }

    #[test]
    fn stop_after_completion_is_a_no_op() {
        let mut reveal = Reveal::complete(3, "done");
        reveal.stop();
        assert_eq!(reveal.state(), RevealState::Complete);
        assert_eq!(reveal.visible_text(), "done");
    }

    #[test]
    fn graphemes_are_revealed_whole() {
        let mut reveal = Reveal::new(1, "e\u{301}👍🏽ñ");
        reveal.start();
        reveal.tick();
        assert_eq!(reveal.visible_text(), "e\u{301}");
        reveal.tick();
        assert_eq!(reveal.visible_text(), "e\u{301}👍🏽");
        assert_eq!(reveal.tick(), RevealState::Complete);
    }

    #[test]
    fn empty_text_completes_immediately() {
        let mut reveal = Reveal::new(1, "");
        reveal.start();
        assert_eq!(reveal.state(), RevealState::Complete);
        assert_eq!(reveal.visible_text(), "");
    }
}
