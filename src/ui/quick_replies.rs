use crate::quick_reply::QuickReply;
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use strum::IntoEnumIterator;

/// Row of suggested prompts with their function keys
pub struct QuickReplyBar<'a> {
    theme: &'a Theme,
}

impl<'a> QuickReplyBar<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for QuickReplyBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for reply in QuickReply::iter() {
            spans.push(Span::styled(format!(" F{} ", reply.hotkey()), self.theme.muted()));
            spans.push(Span::styled(format!("[ {} ]", reply.prompt()), self.theme.button()));
            spans.push(Span::styled(" ", self.theme.base()));
        }

        Paragraph::new(Line::from(spans))
            .style(self.theme.base())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DisplayMode;

    #[test]
    fn lists_every_prompt_with_its_key() {
        let theme = Theme::for_mode(DisplayMode::Dark);
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);

        QuickReplyBar::new(&theme).render(area, &mut buf);

        let row: String = (0..area.width)
            .map(|x| buf.get(x, 0).symbol().to_string())
            .collect();
        assert!(row.contains("F1 [ Help with pricing ]"));
        assert!(row.contains("F2 [ Technical support ]"));
        assert!(row.contains("F3 [ General inquiry ]"));
    }
}
