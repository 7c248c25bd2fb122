//! RunScreeningCallHandler - Drives one screening call from greeting to saved report.
//!
//! The handler owns the call loop: speak the current directive, wait for
//! the patient, extract, hand the turn to the engine, repeat. Every exit
//! path (completion, hangup, silence, channel failure, cancellation) ends
//! in exactly one report, and the report is saved before returning.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::domain::foundation::SessionId;
use crate::domain::screening::{
    CallEndReason, CallMetadata, Directive, EndDirective, InterviewPolicy, Report, ReportStatus,
    TurnCoordinator, TurnInput,
};
use crate::ports::{
    CallChannel, CallEvent, ChannelError, ReasoningEngine, ReportStorage, StorageError,
    StoredReport, Transcript,
};

/// Command to run one screening call.
#[derive(Debug, Clone)]
pub struct RunScreeningCallCommand {
    pub session_id: SessionId,
    pub metadata: CallMetadata,
}

/// Outcome of a finished call.
#[derive(Debug, Clone)]
pub struct RunScreeningCallResult {
    pub session_id: SessionId,
    pub end_reason: CallEndReason,
    pub status: ReportStatus,
    pub questions_asked: u32,
    pub turns: u32,
    pub report: Report,
    pub stored: StoredReport,
    pub transcript: Transcript,
}

/// Errors that escape the call loop.
#[derive(Debug, Error)]
pub enum RunScreeningCallError {
    /// The call finished but the report could not be stored. The report is
    /// carried so the caller can still surface it.
    #[error("report could not be saved: {source}")]
    ReportNotSaved {
        report: Box<Report>,
        #[source]
        source: StorageError,
    },
}

/// Cancellation signal for a running call. Sending `Some(reason)` ends the
/// call with that reason, discarding whatever turn is in flight.
pub type CancelSignal = watch::Receiver<Option<CallEndReason>>;

/// How one exchange with the patient resolved.
enum Exchange {
    Turn(TurnInput),
    Ended(CallEndReason),
}

/// Handler for running screening calls.
pub struct RunScreeningCallHandler {
    reasoning: Arc<dyn ReasoningEngine>,
    channel: Arc<dyn CallChannel>,
    storage: Arc<dyn ReportStorage>,
    policy: Arc<InterviewPolicy>,
    silence_timeout: Option<Duration>,
}

impl RunScreeningCallHandler {
    pub fn new(
        reasoning: Arc<dyn ReasoningEngine>,
        channel: Arc<dyn CallChannel>,
        storage: Arc<dyn ReportStorage>,
        policy: Arc<InterviewPolicy>,
    ) -> Self {
        Self {
            reasoning,
            channel,
            storage,
            policy,
            silence_timeout: None,
        }
    }

    /// Ends the call with `Timeout` if the patient says nothing this long.
    pub fn with_silence_timeout(mut self, silence_timeout: Duration) -> Self {
        self.silence_timeout = Some(silence_timeout);
        self
    }

    pub async fn handle(
        &self,
        cmd: RunScreeningCallCommand,
        cancel: CancelSignal,
    ) -> Result<RunScreeningCallResult, RunScreeningCallError> {
        let session_id = cmd.session_id;
        let mut coordinator = TurnCoordinator::new(session_id, cmd.metadata, self.policy.clone());
        let mut transcript = Transcript::new();

        tracing::info!(session_id = %session_id, "Screening call started");

        let mut directive = coordinator.start();
        let end = loop {
            let pending = match directive {
                Directive::End(end) => break end,
                other => other,
            };
            directive = self
                .run_turn(&mut coordinator, &mut transcript, pending, cancel.clone())
                .await;
        };

        self.say_goodbye(&end, &mut transcript).await;

        let state = coordinator.state();
        let questions_asked = state.questions_asked();
        let turns = state.turn();
        let status = end.report.status();

        tracing::info!(
            session_id = %session_id,
            end_reason = %end.reason,
            status = %status,
            questions_asked,
            turns,
            "Screening call finished"
        );

        let stored = match self.storage.save(&end.report).await {
            Ok(stored) => stored,
            Err(source) => {
                tracing::error!(session_id = %session_id, error = %source, "Failed to save report");
                return Err(RunScreeningCallError::ReportNotSaved {
                    report: Box::new(end.report),
                    source,
                });
            }
        };

        Ok(RunScreeningCallResult {
            session_id,
            end_reason: end.reason,
            status,
            questions_asked,
            turns,
            report: end.report,
            stored,
            transcript,
        })
    }

    /// Speaks one directive and resolves the patient's reaction into the next one.
    ///
    /// The whole exchange races the cancel signal, so a cancellation landing
    /// during phrasing, speech, listening or extraction drops that turn's
    /// input before it reaches the coordinator.
    async fn run_turn(
        &self,
        coordinator: &mut TurnCoordinator,
        transcript: &mut Transcript,
        pending: Directive,
        mut cancel: CancelSignal,
    ) -> Directive {
        let session_id = coordinator.state().session_id();

        let exchange = tokio::select! {
            biased;
            reason = cancelled(&mut cancel) => {
                tracing::warn!(session_id = %session_id, end_reason = %reason, "Call cancelled");
                Exchange::Ended(reason)
            }
            exchange = self.exchange(session_id, transcript, &pending) => exchange,
        };

        match exchange {
            Exchange::Turn(input) => coordinator.handle_turn(input),
            Exchange::Ended(reason) => coordinator.cancel(reason),
        }
    }

    async fn exchange(
        &self,
        session_id: SessionId,
        transcript: &mut Transcript,
        pending: &Directive,
    ) -> Exchange {
        let utterance = match self.reasoning.generate_utterance(pending, transcript).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(session_id = %session_id, error = %err, "Could not phrase directive");
                return Exchange::Ended(CallEndReason::SessionError);
            }
        };

        if let Err(err) = self.channel.speak(&utterance).await {
            return Exchange::Ended(Self::end_reason_for(&err, session_id));
        }
        transcript.push_agent(utterance);
        tracing::debug!(session_id = %session_id, directive = pending.kind(), "Directive spoken");

        let text = match self.wait_for_patient().await {
            Some(Ok(CallEvent::Utterance(text))) => text,
            Some(Ok(CallEvent::Ended(reason))) => return Exchange::Ended(reason),
            Some(Err(err)) => return Exchange::Ended(Self::end_reason_for(&err, session_id)),
            None => return Exchange::Ended(CallEndReason::Timeout),
        };
        transcript.push_patient(text);

        match self.reasoning.extract_fields(transcript, pending).await {
            Ok(input) => Exchange::Turn(input),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "Extraction failed, treating turn as unclear"
                );
                Exchange::Turn(TurnInput::empty())
            }
        }
    }

    /// Next channel event, or `None` once the silence timeout passes.
    async fn wait_for_patient(&self) -> Option<Result<CallEvent, ChannelError>> {
        match self.silence_timeout {
            Some(limit) => timeout(limit, self.channel.next_event()).await.ok(),
            None => Some(self.channel.next_event().await),
        }
    }

    async fn say_goodbye(&self, end: &EndDirective, transcript: &mut Transcript) {
        if end.reason.is_early_disconnect() {
            return;
        }
        let closing = match self
            .reasoning
            .generate_utterance(&Directive::End(end.clone()), transcript)
            .await
        {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => return,
            Err(err) => {
                tracing::warn!(error = %err, "Could not phrase closing line");
                return;
            }
        };
        match self.channel.speak(&closing).await {
            Ok(()) => transcript.push_agent(closing),
            Err(err) => tracing::warn!(error = %err, "Closing line not delivered"),
        }
    }

    fn end_reason_for(err: &ChannelError, session_id: SessionId) -> CallEndReason {
        tracing::warn!(session_id = %session_id, error = %err, "Call channel failed");
        match err {
            ChannelError::Disconnected => CallEndReason::Hangup,
            ChannelError::Transport(_) => CallEndReason::SessionError,
        }
    }
}

/// Resolves with the reason once cancellation is signalled. A dropped
/// sender never cancels.
async fn cancelled(cancel: &mut CancelSignal) -> CallEndReason {
    loop {
        if let Some(reason) = *cancel.borrow_and_update() {
            return reason;
        }
        if cancel.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
