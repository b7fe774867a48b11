mod export;
mod help;
mod state;

use crate::cli::Cli;
use crate::model::SessionEvent;
use crate::orchestrator::{self, UiCommand};
use crate::service::ServiceClient;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use state::{KeyAction, StatusView, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, client: Arc<ServiceClient>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let base_url = client.base_url().to_string();
    let ui_handle = std::thread::spawn(move || run_threaded(base_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&args, client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    base_url: String,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState {
        base_url,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state::apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick();
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state::handle_key(&mut state, k) {
                    KeyAction::Nothing => {}
                    KeyAction::Command(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyAction::CopyReport => match state.report_text() {
                        Some(text) => {
                            state.info = match export::copy_to_clipboard(&text) {
                                Ok(()) => "Copied report to clipboard".into(),
                                Err(e) => format!("Clipboard failed: {e:#}"),
                            };
                        }
                        None => state.info = "No report to copy".into(),
                    },
                    KeyAction::ExportJson => match state.result() {
                        Some(result) => {
                            state.info = match export::export_to_current_dir(result) {
                                Ok(path) => format!("Exported: {}", path.display()),
                                Err(e) => format!("Export failed: {e:#}"),
                            };
                        }
                        None => state.info = "No result to export".into(),
                    },
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Drug input
                Constraint::Min(0),    // Status panel
                Constraint::Length(1), // Info line
            ]
            .as_ref(),
        )
        .split(area);

    draw_input(chunks[0], f, state);
    draw_status(chunks[1], f, state);

    let info = if state.info.is_empty() {
        Line::from(vec![
            Span::styled("?", Style::default().fg(Color::Magenta)),
            Span::raw(" help  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" quit"),
        ])
    } else {
        Line::from(state.info.clone())
    };
    f.render_widget(Paragraph::new(info), chunks[2]);

    if state.show_help {
        let help_area = centered(area, 56, 16);
        help::draw_help(help_area, f);
    }
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (title, border) = if state.editing {
        ("Drug name (Enter to analyze, Esc to leave)", Color::Yellow)
    } else {
        ("Drug name (i to edit)", Color::Gray)
    };
    let mut spans = vec![Span::raw(state.input.clone())];
    if state.editing {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    );
    f.render_widget(input, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = match state.status_view() {
        StatusView::Hint => "pharma-analyst",
        StatusView::Loading { .. } => "Analyzing",
        StatusView::Error(_) => "Error",
        StatusView::Report(_) => "Report",
    };
    let border = match state.status_view() {
        StatusView::Error(_) => Color::Red,
        StatusView::Report(_) => Color::Green,
        _ => Color::Gray,
    };
    let p = Paragraph::new(state::status_lines(state, area.width))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
    f.render_widget(p, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
