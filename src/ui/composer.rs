use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerResult {
    /// Enter pressed; the text stays in place until the caller clears it
    Submit(String),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters
    pub cursor_position: usize,
}

/// Message input. Disabled while a reply is streaming.
#[derive(Debug, Clone)]
pub struct Composer {
    state: TextAreaState,
    enabled: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            state: TextAreaState::default(),
            enabled: true,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerResult::None;
        }

        match key.code {
            // Enter with any modifier held is a newline, never a submit
            KeyCode::Enter => {
                if key.modifiers.is_empty() {
                    return ComposerResult::Submit(self.state.content.clone());
                }
                self.insert_char('\n');
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.insert_char(c);
                }
            }
            KeyCode::Backspace => {
                if self.state.cursor_position > 0 {
                    self.state.cursor_position -= 1;
                    let at = self.byte_index(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.state.cursor_position < self.char_count() {
                    let at = self.byte_index(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.char_count() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                self.state.cursor_position = 0;
            }
            KeyCode::End => {
                self.state.cursor_position = self.char_count();
            }
            _ => {}
        }

        ComposerResult::None
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.state.cursor_position);
        self.state.content.insert(at, c);
        self.state.cursor_position += 1;
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.state
            .content
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.state.content.len())
    }

    fn char_count(&self) -> usize {
        self.state.content.chars().count()
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Replace the text and put the cursor at the end
    pub fn set_content(&mut self, text: &str) {
        self.state.content = text.to_string();
        self.state.cursor_position = self.char_count();
    }

    pub fn clear(&mut self) {
        self.state = TextAreaState::default();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let title = if self.enabled {
            " Type a message "
        } else {
            " Sending... "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(title, theme.button()))
            .title(
                ratatui::widgets::block::Title::from(Span::styled(
                    " Enter send · Shift+Enter newline ",
                    theme.muted(),
                ))
                .alignment(Alignment::Right),
            )
            .border_style(if self.enabled {
                theme.border()
            } else {
                theme.muted()
            })
            .style(theme.base());

        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = if self.state.content.is_empty() && self.enabled {
            vec![Line::from(vec![
                Span::styled("▌", theme.base()),
                Span::styled("How can we help?", theme.muted()),
            ])]
        } else {
            let mut content = self.state.content.clone();
            if self.enabled {
                content.insert(self.byte_index(self.state.cursor_position), '▌');
            }
            content
                .split('\n')
                .map(|line| Line::from(Span::styled(line.to_string(), theme.base())))
                .collect()
        };

        // keep the cursor line in view
        let height = inner.height as usize;
        let skip = lines.len().saturating_sub(height);
        Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
            .style(theme.base())
            .render(inner, buf);
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}
