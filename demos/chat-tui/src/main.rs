//! Terminal chat client with an appointment booking wizard.
//!
//! Run with: cargo run -p chat-wizard-tui -- --base-url http://127.0.0.1:5000
//!
//! Type a message and press Enter. When date or time options are shown,
//! Tab/Left/Right move the highlight and Enter on an empty input picks it.

use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context as _;
use chat_wizard_core::{
    DialogueController, Entry, EntryStore, Role, SurfaceEvent,
    format::{format_reply, to_lines},
};
use chat_wizard_session::{SessionRunner, runner::RunnerState};
use chat_wizard_transport::{
    ClientConfig, HttpTransport,
    tui::{InputAction, OptionPicker, event_to_action},
};
use clap::Parser;
use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Runner = SessionRunner<HttpTransport, Arc<EntryStore>>;

#[derive(Parser, Debug)]
#[command(name = "chat-wizard-tui", about = "Terminal chat client with appointment booking")]
struct Cli {
    /// Chat server base URL.
    #[arg(long, env = "CHAT_WIZARD_BASE_URL")]
    base_url: Option<String>,

    /// Log file (defaults to the user cache directory).
    #[arg(long, env = "CHAT_WIZARD_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    init_tracing(cli.log_file)?;

    let base_url = config.base_url().to_string();
    let store = Arc::new(EntryStore::new());
    let transport = HttpTransport::new(config)?;
    let runner = SessionRunner::spawn(DialogueController::new(transport, Arc::clone(&store)));
    tracing::info!(session = %runner.session_id(), %base_url, "session started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &runner, &store, &base_url).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = runner.shutdown().await {
        tracing::error!("Session shutdown failed: {e}");
    }

    result
}

fn init_tracing(log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => {
            let dir = dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("chat-wizard");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            dir.join("tui.log")
        }
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    Ok(())
}

struct App {
    entries: Vec<Entry>,
    picker: OptionPicker,
    input: String,
    /// Lines scrolled up from the bottom.
    scroll_back: u16,
    base_url: String,
}

impl App {
    fn new(base_url: &str) -> Self {
        Self {
            entries: Vec::new(),
            picker: OptionPicker::default(),
            input: String::new(),
            scroll_back: 0,
            base_url: base_url.to_string(),
        }
    }

    fn apply(&mut self, event: SurfaceEvent) {
        self.picker.observe(&event);
        event.apply_to(&mut self.entries);
        self.scroll_back = 0;
    }

    fn submit(&mut self, runner: &Runner) {
        if self.input.trim().is_empty() {
            if let Some(selection) = self.picker.pick() {
                if let Err(e) = runner.select(selection) {
                    tracing::warn!("Selection refused: {e}");
                }
            }
            return;
        }

        let text = std::mem::take(&mut self.input);
        if let Err(e) = runner.try_submit(text.clone()) {
            tracing::warn!("Submission refused: {e}");
            self.input = text;
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let bot_style = Style::default().fg(Color::Green);
        let user_style = Style::default().fg(Color::Cyan);
        let mut lines = Vec::new();

        let last_options = self
            .entries
            .iter()
            .rposition(|e| matches!(e, Entry::Options { .. }));

        for (i, entry) in self.entries.iter().enumerate() {
            match entry {
                Entry::Message {
                    role: Role::User,
                    text,
                } => {
                    lines.push(Line::from(Span::styled("You", user_style.add_modifier(Modifier::BOLD))));
                    lines.extend(text.lines().map(|l| Line::from(format!("  {l}"))));
                }
                Entry::Message {
                    role: Role::Bot,
                    text,
                } => {
                    lines.push(Line::from(Span::styled("Bot", bot_style.add_modifier(Modifier::BOLD))));
                    lines.extend(
                        to_lines(&format_reply(text))
                            .into_iter()
                            .map(|l| Line::from(format!("  {l}"))),
                    );
                }
                Entry::Options {
                    prompt, options, ..
                } => {
                    lines.push(Line::from(Span::styled("Bot", bot_style.add_modifier(Modifier::BOLD))));
                    lines.push(Line::from(format!("  {prompt}")));

                    let live = Some(i) == last_options && !self.picker.options().is_empty();
                    let mut spans = vec![Span::raw("  ")];
                    for (j, option) in options.iter().enumerate() {
                        let style = if live && j == self.picker.highlighted() {
                            Style::default().fg(Color::Black).bg(Color::Yellow)
                        } else if live {
                            Style::default().fg(Color::Yellow)
                        } else {
                            Style::default().fg(Color::DarkGray)
                        };
                        spans.push(Span::styled(format!("[{}]", option.label), style));
                        spans.push(Span::raw(" "));
                    }
                    lines.push(Line::from(spans));
                }
                Entry::Pending { .. } => {
                    lines.push(Line::from(Span::styled(
                        "Bot is typing...",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    )));
                }
            }
            lines.push(Line::default());
        }

        lines
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runner: &Runner,
    store: &EntryStore,
    base_url: &str,
) -> anyhow::Result<()> {
    let mut app = App::new(base_url);

    // Channel for surface updates
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SurfaceEvent>();
    let mut events = store.history_plus_stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });

    loop {
        // Check for surface updates
        while let Ok(event) = event_rx.try_recv() {
            app.apply(event);
        }

        let state = runner.state();
        terminal.draw(|f| ui(f, &app, state))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Some(action) = event_to_action(&event::read()?) else {
            continue;
        };

        match action {
            InputAction::Quit => return Ok(()),
            InputAction::Char(c) => app.input.push(c),
            InputAction::Backspace => {
                app.input.pop();
            }
            // Input is held while a reply is pending.
            InputAction::Submit if state.busy => {}
            InputAction::Submit => app.submit(runner),
            InputAction::NextOption => app.picker.next(),
            InputAction::PrevOption => app.picker.prev(),
            InputAction::ScrollUp => app.scroll_back = app.scroll_back.saturating_add(1),
            InputAction::ScrollDown => app.scroll_back = app.scroll_back.saturating_sub(1),
            InputAction::PageUp => app.scroll_back = app.scroll_back.saturating_add(10),
            InputAction::PageDown => app.scroll_back = app.scroll_back.saturating_sub(10),
        }
    }
}

/// First row to show so the last wrapped row sits at the bottom of `area`,
/// moved up by `scroll_back` rows.
fn scroll_top(transcript: &Paragraph<'_>, area: Rect, scroll_back: u16) -> u16 {
    // Counts wrapped rows, borders included.
    let rows = u16::try_from(transcript.line_count(area.width)).unwrap_or(u16::MAX);
    rows.saturating_sub(area.height).saturating_sub(scroll_back)
}

fn ui(f: &mut Frame, app: &App, state: RunnerState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    // Transcript area, pinned to the bottom unless scrolled back
    let transcript = Paragraph::new(app.lines())
        .block(Block::default().borders(Borders::ALL).title("Chat"))
        .wrap(Wrap { trim: false });
    let top = scroll_top(&transcript, chunks[0], app.scroll_back);
    f.render_widget(transcript.scroll((top, 0)), chunks[0]);

    // Input area
    let input_style = if state.busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let input = Paragraph::new(app.input.as_str())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(input, chunks[1]);

    // Set cursor
    let cursor = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    f.set_cursor_position((
        chunks[1].x.saturating_add(cursor).saturating_add(1),
        chunks[1].y + 1,
    ));

    // Status bar
    let (mode, mode_style) = match state.step {
        Some(step) => (format!("Booking: {step}"), Style::default().fg(Color::Magenta)),
        None => ("Chat".to_string(), Style::default().fg(Color::Green)),
    };
    let activity = if state.busy { "waiting for reply" } else { "ready" };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Blue)),
        Span::raw(" | "),
        Span::styled(mode, mode_style),
        Span::raw(" | "),
        Span::raw(activity),
        Span::raw(" | "),
        Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)),
        Span::raw(" quit | "),
        Span::styled("Tab/Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" pick option "),
    ]));
    f.render_widget(status, chunks[2]);
}
