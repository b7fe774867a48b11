//! Report renderer.
//!
//! Maps an [`AnalysisResult`] onto display units by direct field projection. Everything here
//! is pure: no I/O, no mutation of the result, and the same input always renders the same way.

use crate::model::{AnalysisResult, ClinicalTrialsSummary, MarketInsight, PatentLandscape};
use crate::session::AnalysisSession;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    ClinicalTrials,
    PatentLandscape,
    MarketInsight,
    LiteratureSynthesis,
    Conclusion,
    FullReport,
}

impl SectionKind {
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::ClinicalTrials => "Clinical Trials Summary",
            SectionKind::PatentLandscape => "Patent Landscape",
            SectionKind::MarketInsight => "Market Insights",
            SectionKind::LiteratureSynthesis => "Literature Synthesis",
            SectionKind::Conclusion => "Conclusion",
            SectionKind::FullReport => "Full Report",
        }
    }
}

/// A labelled field or a line of free text.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayLine {
    Field { label: &'static str, value: String },
    Text(String),
}

impl DisplayLine {
    fn field(label: &'static str, value: impl Into<String>) -> Self {
        DisplayLine::Field {
            label,
            value: value.into(),
        }
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayLine::Field { label, value } if value.is_empty() => write!(f, "{label}:"),
            DisplayLine::Field { label, value } => write!(f, "{label}: {value}"),
            DisplayLine::Text(text) => f.write_str(text),
        }
    }
}

/// One renderable block of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUnit {
    pub kind: SectionKind,
    pub lines: Vec<DisplayLine>,
}

impl DisplayUnit {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub drug: String,
    pub units: Vec<DisplayUnit>,
    /// Present when the result carries a usable report path.
    pub artifact: Option<String>,
}

impl RenderedReport {
    pub fn heading(&self) -> String {
        format!("Analysis Results for {}", self.drug)
    }

    /// Flatten to plain lines, one heading per unit, for text output and the clipboard.
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = vec![self.heading()];
        for unit in &self.units {
            out.push(String::new());
            out.push(format!("== {} ==", unit.title()));
            out.extend(unit.plain_lines());
        }
        out
    }
}

/// The downloadable filename: everything after the last `/`, or the whole path when it has
/// no separator. An empty path (or one ending in `/`) has no artifact.
pub fn artifact_filename(report_path: &str) -> Option<&str> {
    let name = match report_path.rfind('/') {
        Some(idx) => &report_path[idx + 1..],
        None => report_path,
    };
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub fn render(result: &AnalysisResult) -> RenderedReport {
    let sections = &result.sections;
    let artifact = artifact_filename(&result.report_path).map(str::to_string);

    let mut units = vec![
        DisplayUnit {
            kind: SectionKind::ClinicalTrials,
            lines: clinical_lines(&sections.clinical_trials),
        },
        DisplayUnit {
            kind: SectionKind::PatentLandscape,
            lines: patent_lines(&sections.patent_landscape),
        },
        DisplayUnit {
            kind: SectionKind::MarketInsight,
            lines: market_lines(&sections.market_insight),
        },
        DisplayUnit {
            kind: SectionKind::LiteratureSynthesis,
            lines: text_lines(&sections.literature_synthesis),
        },
        DisplayUnit {
            kind: SectionKind::Conclusion,
            lines: text_lines(&sections.conclusion),
        },
    ];

    if let Some(name) = artifact.as_deref() {
        units.push(DisplayUnit {
            kind: SectionKind::FullReport,
            lines: vec![
                DisplayLine::Text(
                    "A detailed PDF report has been generated with all findings.".to_string(),
                ),
                DisplayLine::field("File", name),
            ],
        });
    }

    RenderedReport {
        drug: result.drug.clone(),
        units,
        artifact,
    }
}

/// Render the session's current result, if it has one.
pub fn render_session(session: &AnalysisSession) -> Option<RenderedReport> {
    session.result().map(render)
}

fn clinical_lines(c: &ClinicalTrialsSummary) -> Vec<DisplayLine> {
    let mut lines = vec![
        DisplayLine::field("Total Trials", c.count.to_string()),
        DisplayLine::field("Phase Distribution", distribution(&c.phases)),
        DisplayLine::field("Status Distribution", distribution(&c.statuses)),
    ];
    for trial in &c.examples {
        lines.push(DisplayLine::Text(format!(
            "- {} [{}, {}]",
            trial.indication, trial.phase, trial.status
        )));
        lines.push(DisplayLine::Text(format!("  {}", trial.summary)));
    }
    lines
}

fn patent_lines(p: &PatentLandscape) -> Vec<DisplayLine> {
    let mut lines = vec![DisplayLine::field("Opportunity Level", p.opportunity.as_str())];
    for m in &p.matches {
        lines.push(DisplayLine::Text(format!("- {} ({})", m.title, m.status)));
        lines.push(DisplayLine::Text(format!("  {}", m.assignee)));
        lines.push(DisplayLine::Text(format!("  {}", m.relevance)));
    }
    lines
}

fn market_lines(m: &MarketInsight) -> Vec<DisplayLine> {
    let mut lines = vec![
        DisplayLine::field("Segment", m.segment.as_str()),
        DisplayLine::field("Gap Score", format!("{}/10", number(m.gap_score))),
        DisplayLine::field(
            "Market Size",
            format!("${}M", number(m.estimated_addressable_market_usd_m)),
        ),
        DisplayLine::field("Strategy", m.recommended_strategy.as_str()),
        DisplayLine::Text(m.rationale.clone()),
    ];
    if let Some(note) = m.note.as_deref() {
        lines.push(DisplayLine::field("Note", note));
    }
    lines
}

fn text_lines(text: &str) -> Vec<DisplayLine> {
    text.lines().map(|l| DisplayLine::Text(l.to_string())).collect()
}

fn distribution(map: &BTreeMap<String, u64>) -> String {
    if map.is_empty() {
        return "none".to_string();
    }
    map.iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole numbers print without a fractional part.
fn number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
