use crate::download::{ArtifactOpener, BrowserOpener};
use crate::model::{AnalysisState, ClientConfig, InfoEvent};
use crate::orchestrator::process_analysis;
use crate::render::render_session;
use crate::service::ServiceClient;
use crate::session::AnalysisSession;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "pharma-analyst",
    version,
    about = "Drug repurposing analysis client with optional TUI"
)]
pub struct Cli {
    /// Drug to analyze; starts the interactive TUI when omitted
    pub drug: Option<String>,

    /// Base URL of the analysis service
    #[arg(long, env = "PHARMA_ANALYST_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Request timeout for the analysis call
    #[arg(long, env = "PHARMA_ANALYST_TIMEOUT", default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Print the raw analysis result as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print the text report and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Check that the analysis service is ready and exit
    #[arg(long)]
    pub check: bool,

    /// Open the generated PDF report in the browser after a successful analysis
    #[arg(long)]
    pub open_report: bool,

    /// Download the generated PDF report into DIR (default: your downloads directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub save_report: Option<Option<PathBuf>>,

    /// Export the analysis result as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Whether this invocation runs the interactive TUI.
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && self.drug.is_none() && !self.json && !self.text && !self.check
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let client = ServiceClient::new(&cfg).context("failed to build service client")?;

    if args.check {
        return run_check(&client).await;
    }

    match args.drug.clone() {
        Some(drug) => run_once(&args, &client, &drug).await,
        None if args.json || args.text => Err(anyhow::anyhow!(
            "a drug name is required with --json or --text"
        )),
        None => run_interactive(args, Arc::new(client)).await,
    }
}

#[cfg(feature = "tui")]
async fn run_interactive(args: Cli, client: Arc<ServiceClient>) -> Result<()> {
    crate::tui::run(args, client).await
}

#[cfg(not(feature = "tui"))]
async fn run_interactive(_args: Cli, _client: Arc<ServiceClient>) -> Result<()> {
    // Fallback when built without TUI support.
    Err(anyhow::anyhow!(
        "no drug given; pass a drug name or build with the `tui` feature"
    ))
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("pharma-analyst/{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn run_check(client: &ServiceClient) -> Result<()> {
    let status = client
        .status()
        .await
        .with_context(|| format!("service at {} is not reachable", client.base_url()))?;
    println!("{}: {}", status.service, status.status);
    Ok(())
}

async fn run_once(args: &Cli, client: &ServiceClient, drug: &str) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    if !drug.trim().is_empty() {
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Running multi-agent analysis for {}…",
            drug.trim()
        )));
    }
    let res = analyze_once(args, client, drug, &BrowserOpener).await;

    if let Ok(output) = res.as_ref() {
        for line in &output.stdout {
            let _ = out_tx.send(OutputLine::Stdout(line.clone()));
        }
        for line in &output.stderr {
            let _ = out_tx.send(OutputLine::Stderr(line.clone()));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    res.map(|_| ())
}

/// Lines produced by a one-shot analysis.
pub(crate) struct OnceOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Run a single analysis through a fresh session and format its terminal state.
/// A failed analysis is an error; a blank drug name is ignored.
pub(crate) async fn analyze_once(
    args: &Cli,
    client: &ServiceClient,
    drug: &str,
    opener: &dyn ArtifactOpener,
) -> Result<OnceOutput> {
    let mut session = AnalysisSession::default();
    let mut output = OnceOutput {
        stdout: Vec::new(),
        stderr: Vec::new(),
    };

    if let Err(reason) = session.submit(client, drug).await {
        output
            .stderr
            .push(InfoEvent::Ignored { reason }.to_message());
        return Ok(output);
    }

    let result = match session.state() {
        AnalysisState::Succeeded(result) => result,
        AnalysisState::Failed(message) => {
            return Err(anyhow::anyhow!("Analysis failed: {message}"));
        }
        other => {
            return Err(anyhow::anyhow!(
                "analysis ended in unexpected state: {}",
                other.label()
            ));
        }
    };

    if args.json {
        output.stdout.push(serde_json::to_string_pretty(result)?);
    } else {
        let report = render_session(&session).context("no result to render")?;
        let summary = crate::text_summary::build_text_summary(&report, &completed_at());
        output.stdout.extend(summary.lines);
    }

    let processed = process_analysis(args, client, result, opener).await;
    let artifact_untouched = processed.opened_report.is_none() && processed.saved_report.is_none();
    output.stderr.extend(processed.messages);
    if artifact_untouched && !result.report_path.is_empty() && !args.json {
        output
            .stderr
            .push("Use --open-report or --save-report to retrieve the PDF report".to_string());
    }

    Ok(output)
}

fn completed_at() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
