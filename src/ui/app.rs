use crate::config::Config;
use crate::events::DisplayMode;
use crate::quick_reply::QuickReply;
use crate::session::{ChatSession, SubmitOutcome};
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::history::{ConversationHistory, HistoryScroll};
use crate::ui::quick_replies::QuickReplyBar;
use crate::ui::theme::Theme;
use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use std::io::{self, Stdout};
use tokio::time::Duration;
use tracing::info;

const TICK: Duration = Duration::from_millis(50);
const PAGE: usize = 5;

/// The chat screen: conversation, quick replies, composer
pub struct App {
    session: ChatSession,
    composer: Composer,
    scroll: HistoryScroll,
    mode: DisplayMode,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, session: ChatSession) -> Self {
        Self {
            session,
            composer: Composer::new(),
            scroll: HistoryScroll::default(),
            mode: config.ui.theme,
            should_quit: false,
        }
    }

    /// Run the UI until the user quits
    pub async fn run(mut self) -> Result<()> {
        let mut terminal = setup_terminal().context("Failed to set up terminal")?;
        info!(session = %self.session.id(), "chat UI started");

        let result = self.event_loop(&mut terminal).await;

        restore_terminal(&mut terminal).context("Failed to restore terminal")?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.session.poll_stream();
            self.scroll.sync(self.session.conversation());
            self.composer.set_enabled(!self.session.is_busy());

            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
            // let the reply task make progress on a single-threaded runtime
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('e') if ctrl => self.end_conversation(),
            KeyCode::Char('t') if ctrl => self.toggle_mode(),
            KeyCode::F(n) => {
                if let Some(reply) = QuickReply::from_hotkey(n) {
                    self.composer.set_content(reply.prompt());
                }
            }
            KeyCode::PageUp => self.scroll.scroll_up(PAGE),
            KeyCode::PageDown => self.scroll.scroll_down(PAGE),
            _ => {
                self.composer.set_enabled(!self.session.is_busy());
                if let ComposerResult::Submit(text) = self.composer.handle_key(key) {
                    self.submit(&text);
                }
            }
        }
    }

    fn submit(&mut self, text: &str) {
        let outcome = self.session.submit(text);
        if outcome.accepted() {
            self.composer.clear();
        }
        if outcome == SubmitOutcome::Dispatched {
            self.composer.set_enabled(false);
        }
    }

    fn end_conversation(&mut self) {
        self.session.end_conversation();
        self.composer.clear();
        self.composer.set_enabled(true);
    }

    fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    #[cfg(test)]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[cfg(test)]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    #[cfg(test)]
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    #[cfg(test)]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&self, frame: &mut Frame) {
        let theme = Theme::for_mode(self.mode);
        let area = frame.size();

        frame.render_widget(Block::default().style(theme.backdrop()), area);
        let panel = area.inner(&Margin {
            horizontal: 1,
            vertical: 0,
        });
        frame.render_widget(Block::default().style(theme.base()), panel);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(5),    // History
                Constraint::Length(1), // Quick replies
                Constraint::Length(5), // Composer
                Constraint::Length(1), // Key hints
            ])
            .split(panel);

        self.draw_title(frame, chunks[0], &theme);

        frame.render_widget(
            ConversationHistory::new(
                self.session.conversation().messages(),
                &theme,
                &self.scroll,
            )
            .streaming(self.session.is_busy()),
            chunks[1],
        );

        frame.render_widget(QuickReplyBar::new(&theme), chunks[2]);
        self.composer.render(chunks[3], frame.buffer_mut(), &theme);

        let hints = Line::from(vec![
            Span::styled(" Ctrl+E ", theme.danger()),
            Span::styled("End conversation  ", theme.muted()),
            Span::styled("Ctrl+T ", theme.button()),
            Span::styled("Theme  ", theme.muted()),
            Span::styled("PgUp/PgDn ", theme.button()),
            Span::styled("Scroll  ", theme.muted()),
            Span::styled("Esc ", theme.button()),
            Span::styled("Quit", theme.muted()),
        ]);
        frame.render_widget(Paragraph::new(hints).style(theme.base()), chunks[4]);
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Your next AI assistant",
                theme.title(),
            )))
            .alignment(Alignment::Center)
            .style(theme.base()),
            area,
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("{} ", theme.mode_label()),
                theme.muted(),
            )))
            .alignment(Alignment::Right)
            .style(theme.base()),
            area,
        );
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // needed to tell Shift+Enter apart from Enter
    if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
