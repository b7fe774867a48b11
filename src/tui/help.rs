use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYS: &[(&str, &str)] = &[
    ("Enter", "Submit the drug name (input mode)"),
    ("Esc", "Leave input mode / close help"),
    ("i  /", "Edit the drug name"),
    ("o", "Open the PDF report"),
    ("y", "Copy the report text to the clipboard"),
    ("s", "Export the result as JSON"),
    ("↑/↓ j/k", "Scroll the report"),
    ("PgUp/PgDn", "Scroll faster"),
    ("?", "Toggle this help"),
    ("q  Ctrl-C", "Quit"),
];

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<11}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc.to_string()),
    ])
}

pub fn help_lines() -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYS.iter().map(|(k, d)| key_line(k, d)));
    lines
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    f.render_widget(Clear, area);
    let p = Paragraph::new(help_lines())
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
