//! Analysis lifecycle controller.
//!
//! Owns the analysis session for interactive front ends: dispatches submissions, resolves
//! them, and emits events for presentation layers.

use crate::cli::Cli;
use crate::download::{self, BrowserOpener};
use crate::model::{AnalysisResult, InfoEvent, SessionEvent};
use crate::orchestrator::post_process::{process_analysis, ProcessedAnalysis};
use crate::service::{AnalysisBackend, ServiceClient, ServiceError};
use crate::session::{AnalysisSession, Dispatch, Ticket};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Commands emitted by UI layers to drive the session.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(String),
    OpenReport,
    Quit,
}

/// The one dispatched request, if any.
struct InFlight {
    ticket: Ticket,
    handle: Option<JoinHandle<Result<AnalysisResult, ServiceError>>>,
}

/// Drive one analysis session from UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    args: &Cli,
    client: Arc<ServiceClient>,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut session = AnalysisSession::default();
    let mut in_flight: Option<InFlight> = None;
    // Exports and report retrieval for the latest success run beside the command loop.
    let mut post: Option<JoinHandle<ProcessedAnalysis>> = None;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(raw)) => match session.begin(&raw) {
                        Ok(Dispatch { ticket, request }) => {
                            // Pending is published together with the spawn, before anything awaits.
                            let backend = client.clone();
                            let handle = tokio::spawn(async move { backend.analyze(&request).await });
                            in_flight = Some(InFlight {
                                ticket,
                                handle: Some(handle),
                            });
                            let _ = event_tx.send(SessionEvent::StateChanged(session.state().clone()));
                        }
                        Err(reason) => {
                            let _ = event_tx.send(SessionEvent::Info(InfoEvent::Ignored { reason }));
                        }
                    },
                    Some(UiCommand::OpenReport) => {
                        let info = match session.result() {
                            Some(result) => {
                                match download::download(result, client.base_url(), &BrowserOpener) {
                                    Some(url) => InfoEvent::OpenedReport { url: url.to_string() },
                                    None => InfoEvent::NoReport,
                                }
                            }
                            None => InfoEvent::NoReport,
                        };
                        let _ = event_tx.send(SessionEvent::Info(info));
                    }
                    Some(UiCommand::Quit) | None => {
                        // Nothing waits on an abandoned request once the UI is gone.
                        if let Some(handle) = in_flight.take().and_then(|f| f.handle) {
                            debug!("abandoning in-flight analysis on quit");
                            handle.abort();
                        }
                        if let Some(handle) = post.take() {
                            debug!("abandoning post-processing on quit");
                            handle.abort();
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(f) = &mut in_flight {
                    if let Some(h) = f.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let (Some(join_res), Some(f)) = (maybe_done, in_flight.take()) {
                    let outcome = match join_res {
                        Ok(outcome) => outcome,
                        Err(e) => Err(ServiceError::Task(e.to_string())),
                    };
                    session.resolve(f.ticket, outcome);
                    let _ = event_tx.send(SessionEvent::StateChanged(session.state().clone()));

                    if let Some(result) = session.result() {
                        if let Some(stale) = post.take() {
                            stale.abort();
                        }
                        let (args, client, result) = (args.clone(), client.clone(), result.clone());
                        post = Some(tokio::spawn(async move {
                            process_analysis(&args, &client, &result, &BrowserOpener).await
                        }));
                    }
                }
            }
            post_done = async {
                match post.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                post = None;
                match post_done {
                    Ok(processed) if !processed.messages.is_empty() => {
                        let _ = event_tx.send(SessionEvent::Info(InfoEvent::Message(
                            processed.messages.join("; "),
                        )));
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "post-processing task failed"),
                }
            }
        }
    };

    res
}
