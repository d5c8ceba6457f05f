//! Conversation history display component

use crate::conversation::{ChatMessage, ConversationStore};
use crate::events::ChatRole;
use crate::ui::theme::Theme;
use std::cell::Cell;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Scroll position of the history, counted in lines from the bottom.
/// Any change to the conversation snaps back to the latest message.
#[derive(Debug, Clone, Default)]
pub struct HistoryScroll {
    offset_from_bottom: usize,
    seen_revision: u64,
    /// Furthest offset the last render could show
    max_offset: Cell<usize>,
}

impl HistoryScroll {
    /// Follow the store: new content scrolls to the latest message
    pub fn sync(&mut self, store: &ConversationStore) {
        if store.revision() != self.seen_revision {
            self.seen_revision = store.revision();
            self.offset_from_bottom = 0;
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset_from_bottom = self
            .offset()
            .saturating_add(lines)
            .min(self.max_offset.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset().saturating_sub(lines);
    }

    /// Offset clamped to what the last render could show
    pub fn offset(&self) -> usize {
        self.offset_from_bottom.min(self.max_offset.get())
    }

    fn fit(&self, total_lines: usize, height: usize) -> usize {
        self.max_offset.set(total_lines.saturating_sub(height));
        self.offset()
    }
}

/// Renders the conversation: assistant on the left, user on the right
pub struct ConversationHistory<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: &'a HistoryScroll,
    streaming: bool,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme, scroll: &'a HistoryScroll) -> Self {
        Self {
            messages,
            theme,
            scroll,
            streaming: false,
        }
    }

    /// Mark the last message as still receiving text
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    fn all_lines(&self, width: u16) -> Vec<Line<'static>> {
        let bubble_width = (width as usize * 4 / 5).max(1);
        let mut lines = Vec::new();

        for (index, message) in self.messages.iter().enumerate() {
            let open = self.streaming && index + 1 == self.messages.len();
            lines.extend(self.render_message(message, bubble_width, open));
            lines.push(Line::from(""));
        }
        lines.pop();
        lines
    }

    /// Render a single message into lines
    fn render_message(&self, message: &ChatMessage, width: usize, open: bool) -> Vec<Line<'static>> {
        let alignment = match message.role {
            ChatRole::Assistant => Alignment::Left,
            ChatRole::User => Alignment::Right,
        };
        let bubble = self.theme.bubble(message.role);

        let header = format!(
            "{} · {}",
            message.role.display_name(),
            message.created_at.format("%H:%M")
        );
        let mut lines = vec![Line::from(Span::styled(header, self.theme.muted())).alignment(alignment)];

        let text = if open && message.content.is_empty() {
            "…".to_string()
        } else {
            message.content.clone()
        };

        let wrapped = wrap_text(&text, width.saturating_sub(2));
        let last = wrapped.len().saturating_sub(1);
        for (i, content_line) in wrapped.into_iter().enumerate() {
            let mut spans = vec![Span::styled(format!(" {content_line} "), bubble)];
            if open && i == last {
                spans.push(Span::styled("▋", self.theme.base()));
            }
            lines.push(Line::from(spans).alignment(alignment));
        }

        lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .style(self.theme.base());

        let inner = block.inner(area);
        block.render(area, buf);

        let all_lines = self.all_lines(inner.width);

        // Show the window ending `offset` lines above the bottom
        let height = inner.height as usize;
        let end = all_lines.len() - self.scroll.fit(all_lines.len(), height);
        let start = end.saturating_sub(height);
        let visible: Vec<Line> = all_lines[start..end].to_vec();

        Paragraph::new(visible)
            .style(self.theme.base())
            .render(inner, buf);
    }
}

/// Word-wrap to `width` characters. Explicit newlines are kept and words
/// longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            } else if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }

            for ch in word.chars() {
                if current_len == width {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        }

        lines.push(current);
    }

    lines
}
