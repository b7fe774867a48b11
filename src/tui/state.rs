use crate::model::{AnalysisResult, AnalysisState, SessionEvent};
use crate::orchestrator::UiCommand;
use crate::render::{render, DisplayLine, RenderedReport};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub struct UiState {
    /// Mirror of the controller's session state; only updated from events.
    pub analysis: AnalysisState,
    pub report: Option<RenderedReport>,
    pub input: String,
    pub editing: bool,
    pub info: String,
    pub scroll: u16,
    pub show_help: bool,
    pub base_url: String,
    pub spinner: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            analysis: AnalysisState::Idle,
            report: None,
            input: String::new(),
            editing: true,
            info: String::new(),
            scroll: 0,
            show_help: false,
            base_url: String::new(),
            spinner: 0,
        }
    }
}

/// What the status panel shows. Exactly one at a time.
#[derive(Debug, PartialEq)]
pub enum StatusView<'a> {
    Hint,
    Loading { drug: &'a str },
    Error(&'a str),
    Report(&'a RenderedReport),
}

/// Outcome of a key press that the UI loop has to act on.
#[derive(Debug)]
pub enum KeyAction {
    Nothing,
    Command(UiCommand),
    CopyReport,
    ExportJson,
    Quit,
}

impl UiState {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.analysis {
            AnalysisState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn status_view(&self) -> StatusView<'_> {
        match (&self.analysis, &self.report) {
            (AnalysisState::Pending { drug }, _) => StatusView::Loading { drug },
            (AnalysisState::Failed(message), _) => StatusView::Error(message),
            (AnalysisState::Succeeded(_), Some(report)) => StatusView::Report(report),
            _ => StatusView::Hint,
        }
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER[self.spinner % SPINNER.len()]
    }

    pub fn tick(&mut self) {
        if self.analysis.is_pending() {
            self.spinner = self.spinner.wrapping_add(1);
        }
    }

    /// Plain-text form of the current report, for the clipboard.
    pub fn report_text(&self) -> Option<String> {
        match self.status_view() {
            StatusView::Report(report) => Some(report.to_lines().join("\n")),
            _ => None,
        }
    }
}

pub fn apply_event(state: &mut UiState, ev: SessionEvent) {
    match ev {
        SessionEvent::StateChanged(next) => {
            // A new submission supersedes the previous report.
            state.report = match &next {
                AnalysisState::Succeeded(result) => Some(render(result)),
                _ => None,
            };
            state.scroll = 0;
            state.info = match &next {
                AnalysisState::Idle => String::new(),
                AnalysisState::Pending { drug } => format!("Analyzing {drug}"),
                AnalysisState::Succeeded(_) => "Analysis complete".into(),
                AnalysisState::Failed(_) => "Analysis failed".into(),
            };
            state.analysis = next;
        }
        SessionEvent::Info(info) => {
            state.info = info.to_message();
        }
    }
}

pub fn handle_key(state: &mut UiState, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    if state.editing {
        match key.code {
            KeyCode::Enter => {
                state.editing = false;
                return KeyAction::Command(UiCommand::Submit(state.input.clone()));
            }
            KeyCode::Esc => state.editing = false,
            KeyCode::Backspace => {
                state.input.pop();
            }
            KeyCode::Char(c) => state.input.push(c),
            _ => {}
        }
        return KeyAction::Nothing;
    }

    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('i') | KeyCode::Char('/') => {
            state.editing = true;
            state.show_help = false;
        }
        KeyCode::Char('o') => return KeyAction::Command(UiCommand::OpenReport),
        KeyCode::Char('y') => return KeyAction::CopyReport,
        KeyCode::Char('s') => return KeyAction::ExportJson,
        KeyCode::Char('?') => state.show_help = !state.show_help,
        KeyCode::Esc => state.show_help = false,
        KeyCode::Up | KeyCode::Char('k') => state.scroll = state.scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => state.scroll = state.scroll.saturating_add(1),
        KeyCode::PageUp => state.scroll = state.scroll.saturating_sub(10),
        KeyCode::PageDown => state.scroll = state.scroll.saturating_add(10),
        _ => {}
    }
    KeyAction::Nothing
}

/// Lines for the status panel body.
pub fn status_lines(state: &UiState, status_area_width: u16) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    match state.status_view() {
        StatusView::Hint => {
            out.push(Line::from(
                "Type a drug name and press Enter to run the multi-agent analysis.",
            ));
            out.push(Line::from(""));
            push_wrapped_status_kv(&mut out, "Service", &state.base_url, status_area_width);
        }
        StatusView::Loading { drug } => {
            out.push(Line::from(vec![
                Span::styled(state.spinner_frame(), Style::default().fg(Color::Yellow)),
                Span::raw(format!(" Running multi-agent analysis for {drug}...")),
            ]));
            out.push(Line::from(
                "Clinical trials, patents, market and literature agents are working.",
            ));
        }
        StatusView::Error(message) => {
            out.push(Line::from(Span::styled(
                "Analysis failed",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            push_wrapped_status_kv(&mut out, "Error", message, status_area_width);
            out.push(Line::from(""));
            out.push(Line::from("Press i to edit the drug name and try again."));
        }
        StatusView::Report(report) => report_lines(&mut out, report, status_area_width),
    }
    out
}

fn report_lines(out: &mut Vec<Line<'static>>, report: &RenderedReport, width: u16) {
    out.push(Line::from(Span::styled(
        report.heading(),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )));
    for unit in &report.units {
        out.push(Line::from(""));
        out.push(Line::from(Span::styled(
            unit.title(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for line in &unit.lines {
            match line {
                DisplayLine::Field { label, value } if value.trim().is_empty() => {
                    out.push(Line::from(Span::styled(
                        format!("{label}:"),
                        Style::default().fg(Color::Gray),
                    )));
                }
                DisplayLine::Field { label, value } => {
                    push_wrapped_status_kv(out, label, value, width)
                }
                DisplayLine::Text(text) => out.push(Line::from(text.clone())),
            }
        }
    }
    if report.artifact.is_some() {
        out.push(Line::from(""));
        out.push(Line::from(Span::styled(
            "Press o to open the PDF report",
            Style::default().fg(Color::Magenta),
        )));
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Borders take 2 columns each side.
    let usable_width = status_area_width.saturating_sub(4).max(1) as usize;
    let label_text = format!("{label}:");
    let first_width = usable_width
        .saturating_sub(label_text.chars().count() + 1)
        .max(1);
    let rest_width = usable_width.saturating_sub(2).max(1);

    let chars: Vec<char> = value.chars().collect();
    let (head, mut remaining) = chars.split_at(first_width.min(chars.len()));
    out.push(Line::from(vec![
        Span::styled(label_text, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::raw(head.iter().collect::<String>()),
    ]));
    while !remaining.is_empty() {
        let (chunk, rest) = remaining.split_at(rest_width.min(remaining.len()));
        out.push(Line::from(vec![
            Span::raw("  "),
            Span::raw(chunk.iter().collect::<String>()),
        ]));
        remaining = rest;
    }
}
