//! Post-analysis processing utilities.
//!
//! Handles exports, report opening, and report saving after an analysis succeeds.

use crate::cli::Cli;
use crate::download::{self, ArtifactOpener};
use crate::model::AnalysisResult;
use crate::service::ServiceClient;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Result of post-analysis processing, ready for presentation layers.
pub(crate) struct ProcessedAnalysis {
    pub messages: Vec<String>,
    pub saved_report: Option<PathBuf>,
    pub opened_report: Option<String>,
}

/// Apply the output flags to a succeeded analysis. Failures become messages; none of them
/// affect the session.
pub(crate) async fn process_analysis(
    args: &Cli,
    client: &ServiceClient,
    result: &AnalysisResult,
    opener: &dyn ArtifactOpener,
) -> ProcessedAnalysis {
    let mut messages = Vec::new();

    if let Some(export_path) = args.export_json.as_deref() {
        match export_json(export_path, result) {
            Ok(_) => messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    let mut opened_report = None;
    if args.open_report {
        match download::download(result, client.base_url(), opener) {
            Some(url) => {
                messages.push(format!("Opened report: {url}"));
                opened_report = Some(url.to_string());
            }
            None => messages.push("No report available for this analysis".to_string()),
        }
    }

    let mut saved_report = None;
    if let Some(dir) = args.save_report.as_ref() {
        let dir = dir.clone().unwrap_or_else(download::default_report_dir);
        match download::save_report(client, result, &dir).await {
            Ok(Some(path)) => {
                messages.push(format!("Saved report: {}", path.display()));
                saved_report = Some(path);
            }
            Ok(None) => messages.push("No report available for this analysis".to_string()),
            Err(e) => messages.push(format!("Save report failed: {e:#}")),
        }
    }

    ProcessedAnalysis {
        messages,
        saved_report,
        opened_report,
    }
}

/// Write the result as pretty JSON.
pub(crate) fn export_json(path: &Path, result: &AnalysisResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(result).context("serialize analysis result")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
