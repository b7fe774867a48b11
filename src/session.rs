//! Analysis session: the request lifecycle state machine.
//!
//! A session owns the single current [`AnalysisState`]. Submissions move it to `Pending`
//! and hand out a [`Ticket`]; resolving that ticket is the only way to reach a terminal
//! state, and a ticket can be resolved once.

use crate::model::{AnalysisRequest, AnalysisResult, AnalysisState, IgnoreReason};
use crate::service::{AnalysisBackend, ServiceError};
use tracing::{debug, info, warn};

/// Pairs a `Pending` state with the dispatch that produced it. Not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// A request cleared for dispatch, plus the ticket that resolves it.
#[derive(Debug)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub request: AnalysisRequest,
}

#[derive(Debug, Default)]
pub struct AnalysisSession {
    state: AnalysisState,
    generation: u64,
}

impl AnalysisSession {
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// The current result, only while the session is `Succeeded`.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            AnalysisState::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    /// Validate input and, when accepted, move to `Pending`. The caller must dispatch the
    /// returned request and feed the outcome back through [`AnalysisSession::resolve`].
    pub fn begin(&mut self, raw: &str) -> Result<Dispatch, IgnoreReason> {
        let Some(request) = AnalysisRequest::new(raw) else {
            debug!("ignoring blank submission");
            return Err(IgnoreReason::BlankInput);
        };
        if self.state.is_pending() {
            debug!(drug = request.drug(), "ignoring submission while pending");
            return Err(IgnoreReason::AlreadyPending);
        }

        self.generation += 1;
        self.state = AnalysisState::Pending {
            drug: request.drug().to_string(),
        };
        info!(drug = request.drug(), generation = self.generation, "analysis pending");
        Ok(Dispatch {
            ticket: Ticket {
                generation: self.generation,
            },
            request,
        })
    }

    /// Apply the outcome of a dispatched request. Returns `false` (and changes nothing) when
    /// the ticket does not belong to the current pending submission.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, ServiceError>,
    ) -> bool {
        if !self.state.is_pending() || ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale resolution"
            );
            return false;
        }

        self.state = match outcome {
            Ok(result) => {
                info!(drug = %result.drug, "analysis succeeded");
                AnalysisState::Succeeded(Box::new(result))
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                AnalysisState::Failed(e.user_message())
            }
        };
        true
    }

    /// Submit and await the resolution in one step.
    pub async fn submit<B>(&mut self, backend: &B, raw: &str) -> Result<&AnalysisState, IgnoreReason>
    where
        B: AnalysisBackend + ?Sized,
    {
        let Dispatch { ticket, request } = self.begin(raw)?;
        let outcome = backend.analyze(&request).await;
        self.resolve(ticket, outcome);
        Ok(&self.state)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::fixtures::sample_result;
    use crate::service::FALLBACK_MESSAGE;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that records every dispatched drug and replays scripted outcomes.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        pub dispatched: Mutex<Vec<String>>,
        outcomes: Mutex<VecDeque<Result<AnalysisResult, ServiceError>>>,
    }

    impl ScriptedBackend {
        pub fn with(outcomes: Vec<Result<AnalysisResult, ServiceError>>) -> Self {
            Self {
                dispatched: Mutex::new(Vec::new()),
                outcomes: Mutex::new(outcomes.into()),
            }
        }

        pub fn dispatch_count(&self) -> usize {
            self.dispatched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalysisBackend for ScriptedBackend {
        async fn analyze(
            &self,
            request: &AnalysisRequest,
        ) -> Result<AnalysisResult, ServiceError> {
            self.dispatched
                .lock()
                .unwrap()
                .push(request.drug().to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ServiceError::Api {
                    status: 500,
                    message: None,
                }))
        }
    }

    fn api_error(message: &str) -> ServiceError {
        ServiceError::Api {
            status: 500,
            message: Some(message.into()),
        }
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let backend = ScriptedBackend::default();
        let mut session = AnalysisSession::default();

        for raw in ["", "   ", "\t\n"] {
            assert_eq!(
                session.submit(&backend, raw).await.unwrap_err(),
                IgnoreReason::BlankInput
            );
        }
        assert_eq!(session.state(), &AnalysisState::Idle);
        assert_eq!(backend.dispatch_count(), 0);
    }

    #[test]
    fn fresh_session_is_idle_with_no_result() {
        let session = AnalysisSession::default();
        assert_eq!(session.state(), &AnalysisState::Idle);
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn valid_input_dispatches_once_with_trimmed_name() {
        let backend = ScriptedBackend::with(vec![Ok(sample_result())]);
        let mut session = AnalysisSession::default();

        let state = session.submit(&backend, "  Metformin ").await.unwrap();
        assert_eq!(state, &AnalysisState::Succeeded(Box::new(sample_result())));
        assert_eq!(*backend.dispatched.lock().unwrap(), vec!["Metformin".to_string()]);
        assert_eq!(session.result(), Some(&sample_result()));
    }

    #[tokio::test]
    async fn failure_carries_server_message() {
        let backend = ScriptedBackend::with(vec![Err(api_error("rate limited"))]);
        let mut session = AnalysisSession::default();

        session.submit(&backend, "Metformin").await.unwrap();
        assert_eq!(session.state(), &AnalysisState::Failed("rate limited".into()));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn failure_without_message_uses_fallback() {
        let backend = ScriptedBackend::with(vec![Err(ServiceError::Api {
            status: 503,
            message: None,
        })]);
        let mut session = AnalysisSession::default();

        session.submit(&backend, "Metformin").await.unwrap();
        assert_eq!(session.state(), &AnalysisState::Failed(FALLBACK_MESSAGE.into()));
    }

    #[tokio::test]
    async fn submit_while_pending_is_ignored() {
        let backend = ScriptedBackend::default();
        let mut session = AnalysisSession::default();

        let first = session.begin("Metformin").unwrap();
        let before = session.state().clone();

        assert_eq!(
            session.submit(&backend, "Aspirin").await.unwrap_err(),
            IgnoreReason::AlreadyPending
        );
        assert_eq!(session.state(), &before);
        assert_eq!(backend.dispatch_count(), 0);

        // The original in-flight request still resolves normally.
        assert!(session.resolve(first.ticket, Ok(sample_result())));
        assert!(session.result().is_some());
    }

    #[test]
    fn stale_ticket_cannot_cause_second_transition() {
        let mut session = AnalysisSession::default();
        let first = session.begin("Metformin").unwrap();
        assert!(session.resolve(first.ticket, Err(api_error("boom"))));

        let second = session.begin("Aspirin").unwrap();
        let stale = Ticket { generation: 1 };
        assert!(!session.resolve(stale, Ok(sample_result())));
        assert_eq!(
            session.state(),
            &AnalysisState::Pending {
                drug: "Aspirin".into()
            }
        );

        assert!(session.resolve(second.ticket, Ok(sample_result())));
        assert!(matches!(session.state(), AnalysisState::Succeeded(_)));
    }

    #[test]
    fn resolve_without_pending_is_rejected() {
        let mut session = AnalysisSession::default();
        assert!(!session.resolve(Ticket { generation: 0 }, Ok(sample_result())));
        assert_eq!(session.state(), &AnalysisState::Idle);
    }

    #[tokio::test]
    async fn new_success_replaces_previous_result() {
        let mut second = sample_result();
        second.drug = "Aspirin".into();
        second.report_path = "output/reports/aspirin.pdf".into();
        let backend = ScriptedBackend::with(vec![Ok(sample_result()), Ok(second.clone())]);
        let mut session = AnalysisSession::default();

        session.submit(&backend, "Metformin").await.unwrap();
        session.submit(&backend, "Aspirin").await.unwrap();
        assert_eq!(session.result(), Some(&second));
        assert_eq!(backend.dispatch_count(), 2);
    }

    #[tokio::test]
    async fn resubmission_after_failure_is_allowed() {
        let backend = ScriptedBackend::with(vec![Err(api_error("rate limited")), Ok(sample_result())]);
        let mut session = AnalysisSession::default();

        session.submit(&backend, "Metformin").await.unwrap();
        assert!(matches!(session.state(), AnalysisState::Failed(_)));
        session.submit(&backend, "Metformin").await.unwrap();
        assert!(matches!(session.state(), AnalysisState::Succeeded(_)));
    }
}
