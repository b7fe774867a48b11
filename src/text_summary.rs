//! Text summary builder for CLI output.
//!
//! This module formats a rendered report into human-readable lines for text mode.

use crate::render::RenderedReport;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a rendered report.
pub(crate) fn build_text_summary(report: &RenderedReport, completed_at: &str) -> TextSummary {
    let mut lines = report.to_lines();
    lines.push(String::new());
    lines.push(format!("Completed: {completed_at}"));
    TextSummary { lines }
}
