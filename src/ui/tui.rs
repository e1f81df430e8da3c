// Terminal User Interface implementation
// Draws the spectrum chart with a title and a status bar

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::app::pipeline::SpectrumPipeline;
use crate::app::App;
use crate::network::ConnectionState;
use crate::render::ChartDimensions;
use crate::ui::commands::Command;
use crate::ui::widgets::SpectrumBars;

/// Screen regions
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title: Rect,
    pub chart: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(3),    // Chart
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        Self {
            title: chunks[0],
            chart: chunks[1],
            status_bar: chunks[2],
        }
    }

    /// Size of the drawable area inside the chart border
    pub fn chart_dimensions(&self) -> ChartDimensions {
        let inner = chart_block().inner(self.chart);
        ChartDimensions::new(inner.width as u32, inner.height as u32)
    }
}

fn chart_block() -> Block<'static> {
    Block::default().title("Spectrum").borders(Borders::ALL)
}

pub struct Tui<B: Backend> {
    terminal: Terminal<B>,
    restore_on_drop: bool,
}

impl Tui<CrosstermBackend<Stdout>> {
    /// Take over the terminal: raw mode plus the alternate screen
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;

        Ok(Self {
            terminal,
            restore_on_drop: true,
        })
    }
}

impl<B: Backend> Tui<B> {
    /// Draw onto an arbitrary backend without touching the real terminal
    pub fn with_backend(backend: B) -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            restore_on_drop: false,
        })
    }

    /// Fit the chart to the current terminal size and redraw
    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        let layout = AppLayout::new(self.terminal.size()?);
        app.pipeline_mut().resize(layout.chart_dimensions());

        let endpoint = app.settings().endpoint_url.clone();
        let pipeline = app.pipeline();
        self.terminal
            .draw(|f| render(f, &layout, &endpoint, pipeline))?;

        Ok(())
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> Drop for Tui<B> {
    fn drop(&mut self) {
        if self.restore_on_drop {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = self.terminal.show_cursor();
        }
    }
}

/// Wait up to `timeout` for a key press that maps to a command
pub fn poll_command(timeout: Duration) -> Result<Option<Command>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Command::from_key(key));
        }
    }
    Ok(None)
}

fn render(f: &mut Frame, layout: &AppLayout, endpoint: &str, pipeline: &SpectrumPipeline) {
    let title = Paragraph::new(format!("spectrum-client | {}", endpoint))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, layout.title);

    let bars = SpectrumBars::new(pipeline.reconciler()).block(chart_block());
    f.render_widget(bars, layout.chart);

    let (state, color) = match pipeline.connection_state() {
        ConnectionState::Connected => ("Connected", Color::Green),
        ConnectionState::Connecting => ("Connecting", Color::Yellow),
        ConnectionState::Disconnected => ("Disconnected", Color::Red),
    };
    let stats = pipeline.stats();
    let status_text = format!(
        "{} | {} bars | {} frames, {} dropped | {}",
        state,
        pipeline.reconciler().len(),
        stats.frames_rendered,
        stats.frames_dropped,
        Command::help()
    );
    let status = Paragraph::new(Span::raw(status_text))
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, layout.status_bar);
}
