use crate::events::{ChatRole, DisplayMode};
use ratatui::style::{Color, Modifier, Style};

const PRIMARY: Color = Color::Rgb(0x19, 0x76, 0xd2);
const SECONDARY: Color = Color::Rgb(0x9c, 0x27, 0xb0);
const ERROR: Color = Color::Rgb(0xd3, 0x2f, 0x2f);

/// Colours for one display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub mode: DisplayMode,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
}

impl Theme {
    pub fn for_mode(mode: DisplayMode) -> Theme {
        match mode {
            DisplayMode::Light => Theme {
                mode,
                background: Color::Rgb(0xf0, 0xf0, 0xf0),
                surface: Color::Rgb(0xff, 0xff, 0xff),
                text: Color::Rgb(0x00, 0x00, 0x00),
                muted: Color::Rgb(0x75, 0x75, 0x75),
                border: Color::Rgb(0x00, 0x00, 0x00),
            },
            DisplayMode::Dark => Theme {
                mode,
                background: Color::Rgb(0x12, 0x12, 0x12),
                surface: Color::Rgb(0x1e, 0x1e, 0x1e),
                text: Color::Rgb(0xff, 0xff, 0xff),
                muted: Color::Rgb(0x9e, 0x9e, 0x9e),
                border: Color::Rgb(0x44, 0x44, 0x44),
            },
        }
    }

    /// Page colour around the chat panel
    pub fn backdrop(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.surface)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border).bg(self.surface)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted).bg(self.surface)
    }

    pub fn title(&self) -> Style {
        self.base().add_modifier(Modifier::BOLD)
    }

    /// Message bubble: assistant in the primary colour, user in secondary
    pub fn bubble(&self, role: ChatRole) -> Style {
        let bg = match role {
            ChatRole::Assistant => PRIMARY,
            ChatRole::User => SECONDARY,
        };
        Style::default().fg(Color::White).bg(bg)
    }

    pub fn button(&self) -> Style {
        Style::default().fg(PRIMARY).bg(self.surface)
    }

    pub fn danger(&self) -> Style {
        Style::default().fg(ERROR).bg(self.surface)
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            DisplayMode::Light => "☀ Light",
            DisplayMode::Dark => "☾ Dark",
        }
    }
}
