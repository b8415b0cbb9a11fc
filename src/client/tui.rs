use crate::client::controller::SessionController;
use crate::client::view::SessionView;
use crate::core::config::UiConfig;
use crate::core::{Config, FailureReason, Message, Role, Session};
use crate::utils::tui_writer::{LogEntry, LogLevel};
use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Duration;

use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

const SESSION_PANE_WIDTH: u16 = 32;
const LOG_PANE_HEIGHT: u16 = 5;
const MAX_SYSTEM_LOGS: usize = 200;

pub type TuiController = SessionController<Arc<ChatScreen>>;

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Welcome,
    Message(Message),
    Banner(String),
}

/// Everything the TUI draws that the controller can change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenState {
    pub sessions: Vec<Session>,
    pub active: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub loading: bool,
    pub input: String,
    armed_delete: Option<String>,
}

/// [`SessionView`] backing the terminal UI. The controller writes into it
/// from spawned tasks; the draw loop reads a snapshot on every frame.
#[derive(Debug, Default)]
pub struct ChatScreen {
    state: Mutex<ScreenState>,
}

impl ChatScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScreenState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ScreenState {
        self.lock().clone()
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn push_input(&self, c: char) {
        self.lock().input.push(c);
    }

    pub fn pop_input(&self) {
        self.lock().input.pop();
    }

    /// Grant the next delete confirmation for `session_id` only.
    pub fn arm_delete(&self, session_id: &str) {
        self.lock().armed_delete = Some(session_id.to_string());
    }
}

impl SessionView for ChatScreen {
    fn render_sessions(&self, sessions: &[Session], active: Option<&str>) {
        let mut state = self.lock();
        state.sessions = sessions.to_vec();
        state.active = active.map(str::to_string);
    }

    fn reset_transcript(&self, messages: &[Message]) {
        let mut state = self.lock();
        state.transcript = if messages.is_empty() {
            vec![TranscriptEntry::Welcome]
        } else {
            messages.iter().cloned().map(TranscriptEntry::Message).collect()
        };
    }

    fn append_message(&self, message: &Message) {
        let mut state = self.lock();
        state
            .transcript
            .retain(|entry| *entry != TranscriptEntry::Welcome);
        state
            .transcript
            .push(TranscriptEntry::Message(message.clone()));
    }

    fn set_loading(&self, loading: bool) {
        self.lock().loading = loading;
    }

    fn show_error(&self, text: &str) {
        self.lock()
            .transcript
            .push(TranscriptEntry::Banner(text.to_string()));
    }

    fn clear_input(&self) {
        self.lock().input.clear();
    }

    fn confirm_delete(&self, session: &Session) -> bool {
        self.lock().armed_delete.take().as_deref() == Some(session.id.as_str())
    }
}

pub struct ChatTui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    screen: Arc<ChatScreen>,
    controller: Arc<TuiController>,
    ui: UiConfig,
    backend_url: String,
    selected: usize,
    pending_delete: Option<Session>,
    system_logs: Vec<LogEntry>,
}

impl ChatTui {
    pub fn new(config: &Config) -> Result<Self> {
        let screen = Arc::new(ChatScreen::new());
        let controller = Arc::new(SessionController::from_config(config, Arc::clone(&screen))?);
        let backend_url = controller.client().base_url().to_string();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ChatTui {
            terminal,
            screen,
            controller,
            ui: config.ui.clone(),
            backend_url,
            selected: 0,
            pending_delete: None,
            system_logs: Vec::new(),
        })
    }

    pub async fn run(&mut self, mut log_rx: UnboundedReceiver<LogEntry>) -> Result<()> {
        tracing::info!("Connecting to {}", self.backend_url);
        self.spawn(|c| async move { report("list sessions", c.list_sessions().await) });

        let mut event_stream = EventStream::new();
        // Controller tasks update the screen behind our back; redraw regularly.
        let mut redraw_interval = tokio::time::interval(Duration::from_millis(200));

        loop {
            if let Err(e) = self.draw() {
                tracing::error!("Draw failed: {}", e);
                self.cleanup();
                return Err(e);
            }

            tokio::select! {
                biased;
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key) {
                                tracing::info!("User requested quit");
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("Terminal event error: {}", e);
                            self.cleanup();
                            return Err(e.into());
                        }
                        None => break,
                    }
                }
                Some(entry) = log_rx.recv() => self.add_system_log(entry),
                _ = redraw_interval.tick() => {}
            }
        }

        self.cleanup();
        Ok(())
    }

    fn spawn<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<TuiController>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(op(Arc::clone(&self.controller)));
    }

    fn selected_session(&self) -> Option<Session> {
        self.screen.snapshot().sessions.get(self.selected).cloned()
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Some(session) = self.pending_delete.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.screen.arm_delete(&session.id);
                self.spawn(move |c| async move {
                    report("delete session", c.delete_session(&session.id).await)
                });
            }
            return false;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return true,
            KeyCode::Esc => return true,
            KeyCode::Char('n') if ctrl => {
                self.selected = 0;
                self.spawn(|c| async move { report("create session", c.create_session().await) });
            }
            KeyCode::Char('r') if ctrl => {
                self.spawn(|c| async move { report("list sessions", c.list_sessions().await) });
            }
            KeyCode::Char('o') if ctrl => {
                if let Some(session) = self.selected_session() {
                    self.spawn(move |c| async move {
                        report("load session", c.load_session(&session.id).await)
                    });
                }
            }
            KeyCode::Char('d') if ctrl => {
                self.pending_delete = self.selected_session();
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                let count = self.screen.snapshot().sessions.len();
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                let text = self.screen.input();
                if !text.trim().is_empty() {
                    self.spawn(move |c| async move {
                        report("send message", c.send_message(&text).await)
                    });
                }
            }
            KeyCode::Backspace => self.screen.pop_input(),
            KeyCode::Char(ch) if !ctrl => self.screen.push_input(ch),
            _ => {}
        }
        false
    }

    pub fn add_system_log(&mut self, log_entry: LogEntry) {
        self.system_logs.push(log_entry);
        if self.system_logs.len() > MAX_SYSTEM_LOGS {
            let excess = self.system_logs.len() - MAX_SYSTEM_LOGS;
            self.system_logs.drain(..excess);
        }
    }

    fn cleanup(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }

    fn draw(&mut self) -> Result<()> {
        let screen = self.screen.snapshot();
        if !screen.sessions.is_empty() {
            self.selected = self.selected.min(screen.sessions.len() - 1);
        }
        let selected = self.selected;
        let processing = self.controller.is_processing();
        let pending_delete = self.pending_delete.clone();
        let system_logs = &self.system_logs;
        let ui = &self.ui;
        let backend_url = &self.backend_url;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header
                    Constraint::Min(8),    // Sessions + transcript
                    Constraint::Length(LOG_PANE_HEIGHT),
                    Constraint::Length(3), // Input
                    Constraint::Length(1), // Footer
                ])
                .split(f.area());

            draw_header(f, chunks[0], backend_url, processing);

            let main_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SESSION_PANE_WIDTH), Constraint::Min(20)])
                .split(chunks[1]);
            draw_sessions(f, main_chunks[0], &screen, selected, ui);
            draw_transcript(f, main_chunks[1], &screen, ui);

            draw_system_logs(f, chunks[2], system_logs);
            draw_input(f, chunks[3], &screen.input);

            let footer = Paragraph::new(
                "Enter: Send | Ctrl+N: New | ↑/↓: Select | Ctrl+O: Open | Ctrl+D: Delete | Ctrl+R: Refresh | Esc: Quit",
            )
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
            f.render_widget(footer, chunks[4]);

            if let Some(session) = &pending_delete {
                let area = f.area();
                draw_delete_overlay(f, area, session, ui);
            }
        })?;

        Ok(())
    }
}

impl Drop for ChatTui {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Controller failures were already logged and bannered; keep a trace only.
fn report<T>(operation: &str, result: Result<T, FailureReason>) {
    if let Err(e) = result {
        tracing::debug!("{} finished with failure: {}", operation, e);
    }
}

fn draw_header(f: &mut Frame, area: Rect, backend_url: &str, processing: bool) {
    let mut spans = vec![
        Span::styled(
            "💬 chatmux",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", backend_url), Style::default().fg(Color::Gray)),
    ];
    if processing {
        spans.push(Span::styled(
            "  ⏳ waiting for reply",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
    f.render_widget(header, area);
}

fn draw_sessions(f: &mut Frame, area: Rect, screen: &ScreenState, selected: usize, ui: &UiConfig) {
    let block = Block::default()
        .title("📋 Sessions")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let items: Vec<ListItem> = screen
        .sessions
        .iter()
        .map(|session| {
            let is_active = screen.active.as_deref() == Some(session.id.as_str());
            let marker = if is_active { "● " } else { "  " };
            let style = if is_active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("{}{}", marker, session.display_title(&ui.placeholder_title)),
                    style,
                )),
                Line::from(Span::styled(
                    format!("  {}", session.time),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut list_state = ListState::default();
    if !screen.sessions.is_empty() {
        list_state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn transcript_lines<'a>(screen: &'a ScreenState, ui: &'a UiConfig) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for entry in &screen.transcript {
        match entry {
            TranscriptEntry::Welcome => {
                lines.push(Line::from(Span::styled(
                    ui.welcome_title.as_str(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    ui.welcome_text.as_str(),
                    Style::default().fg(Color::Gray),
                )));
            }
            TranscriptEntry::Message(message) => {
                let (label, color) = match &message.role {
                    Role::User => ("You".to_string(), Color::Yellow),
                    Role::Assistant => ("Assistant".to_string(), Color::Green),
                    Role::Other(role) => (role.clone(), Color::Magenta),
                };
                lines.push(Line::from(Span::styled(
                    label,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
                lines.extend(message.content.lines().map(Line::raw));
            }
            TranscriptEntry::Banner(text) => {
                lines.push(Line::from(Span::styled(
                    format!("⚠ {}", text),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    if screen.loading {
        lines.push(Line::from(Span::styled(
            "● ● ●",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// Scroll offset that puts the last wrapped row of `transcript` on the bottom
/// edge of a `width` x `height` area.
fn bottom_scroll(transcript: &Paragraph, width: u16, height: u16) -> u16 {
    let total = transcript.line_count(width.max(1));
    total
        .saturating_sub(usize::from(height))
        .min(usize::from(u16::MAX)) as u16
}

fn draw_transcript(f: &mut Frame, area: Rect, screen: &ScreenState, ui: &UiConfig) {
    let block = Block::default()
        .title("💬 Conversation")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let transcript = Paragraph::new(transcript_lines(screen, ui)).wrap(Wrap { trim: false });
    let scroll = bottom_scroll(
        &transcript,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    );
    f.render_widget(transcript.block(block).scroll((scroll, 0)), area);
}

fn draw_input(f: &mut Frame, area: Rect, input: &str) {
    let block = Block::default()
        .title("✏️  Message")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(input),
        Span::styled("▏", Style::default().fg(Color::Gray)),
    ]))
    .block(block);
    f.render_widget(prompt, area);
}

fn draw_system_logs(f: &mut Frame, area: Rect, logs: &[LogEntry]) {
    let logs_block = Block::default()
        .title("📋 System Logs")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    if logs.is_empty() {
        let no_logs = Paragraph::new("No system logs")
            .style(Style::default().fg(Color::Gray))
            .block(logs_block)
            .alignment(Alignment::Center);
        f.render_widget(no_logs, area);
        return;
    }

    let visible = usize::from(area.height.saturating_sub(2));
    let log_lines: Vec<Line> = logs
        .iter()
        .skip(logs.len().saturating_sub(visible))
        .map(|log| {
            let timestamp = log.timestamp.format("%H:%M:%S").to_string();
            let level_color = match log.level {
                LogLevel::Error => Color::Red,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Info => Color::Cyan,
                LogLevel::Debug => Color::Gray,
                LogLevel::Trace => Color::DarkGray,
            };

            Line::from(vec![
                Span::styled(format!("[{}] ", timestamp), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{:<5} ", log.level.as_str()),
                    Style::default()
                        .fg(level_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(log.message.as_str(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let logs_paragraph = Paragraph::new(log_lines).block(logs_block);
    f.render_widget(logs_paragraph, area);
}

fn draw_delete_overlay(f: &mut Frame, area: Rect, session: &Session, ui: &UiConfig) {
    let overlay_width = 50.min(area.width);
    let overlay_height = 7.min(area.height);
    let overlay_x = area.width.saturating_sub(overlay_width) / 2;
    let overlay_y = area.height.saturating_sub(overlay_height) / 2;
    let overlay_area = Rect::new(overlay_x, overlay_y, overlay_width, overlay_height);

    let message = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Delete \"{}\"?", session.display_title(&ui.placeholder_title)),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            "This cannot be undone.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled("y: Delete | any other key: Keep", Style::default().fg(Color::Gray))),
    ];

    let overlay_block = Block::default()
        .title(" 🗑  DELETE SESSION ")
        .borders(Borders::ALL)
        .border_style(Style::default().bg(Color::Red).fg(Color::White).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black));

    let overlay_content = Paragraph::new(message)
        .block(overlay_block)
        .alignment(Alignment::Center);

    f.render_widget(Clear, overlay_area);
    f.render_widget(overlay_content, overlay_area);
}
