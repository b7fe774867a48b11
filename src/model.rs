use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

/// A validated analysis submission. Only constructible from a non-blank drug name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    drug: String,
}

impl AnalysisRequest {
    /// Trim the raw input; blank input yields `None` and must not be sent.
    pub fn new(raw: &str) -> Option<Self> {
        let drug = raw.trim();
        if drug.is_empty() {
            return None;
        }
        Some(Self {
            drug: drug.to_string(),
        })
    }

    pub fn drug(&self) -> &str {
        &self.drug
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub drug: String,
    pub sections: Sections,
    #[serde(default)]
    pub report_path: String,
}

/// The fixed set of report sections, keyed the way the analysis service emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(rename = "Clinical Trials Summary")]
    pub clinical_trials: ClinicalTrialsSummary,
    #[serde(rename = "Patent Landscape")]
    pub patent_landscape: PatentLandscape,
    #[serde(rename = "Market Insight")]
    pub market_insight: MarketInsight,
    #[serde(rename = "Literature Synthesis")]
    pub literature_synthesis: String,
    #[serde(rename = "Conclusion")]
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalTrialsSummary {
    pub count: u64,
    pub phases: BTreeMap<String, u64>,
    pub statuses: BTreeMap<String, u64>,
    pub examples: Vec<TrialExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialExample {
    pub indication: String,
    pub phase: String,
    pub status: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentLandscape {
    pub opportunity: String,
    // Omitted by the service when no patents matched.
    #[serde(default)]
    pub matches: Vec<PatentMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patent_coverage: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentMatch {
    pub title: String,
    pub status: String,
    pub assignee: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsight {
    pub segment: String,
    pub gap_score: f64,
    pub estimated_addressable_market_usd_m: f64,
    pub recommended_strategy: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body the analysis service returns alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Readiness document served at the service root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub service: String,
    pub status: String,
}

/// Lifecycle of the current analysis. Exactly one variant holds at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending { drug: String },
    Succeeded(Box<AnalysisResult>),
    Failed(String),
}

impl AnalysisState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AnalysisState::Pending { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Pending { .. } => "pending",
            AnalysisState::Succeeded(_) => "succeeded",
            AnalysisState::Failed(_) => "failed",
        }
    }
}

/// Events emitted by the controller loop and consumed by UI layers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(AnalysisState),
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Ignored { reason: IgnoreReason },
    OpenedReport { url: String },
    NoReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BlankInput,
    AlreadyPending,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Ignored {
                reason: IgnoreReason::BlankInput,
            } => "Enter a drug name to analyze".to_string(),
            InfoEvent::Ignored {
                reason: IgnoreReason::AlreadyPending,
            } => "An analysis is already running".to_string(),
            InfoEvent::OpenedReport { url } => format!("Opened report: {url}"),
            InfoEvent::NoReport => "No report available for this analysis".to_string(),
        }
    }
}
