//! Turn coordinator.
//!
//! Runs one conversational turn: records extractions, asks the phase
//! controller and then the question budget (once each), and answers with the
//! next directive. Every path ends in a report.

use std::sync::Arc;

use super::budget::{BudgetAction, QuestionBudget};
use super::controller::{PhaseController, PhaseOutcome};
use super::directive::{
    ConfirmationDirective, Directive, EndDirective, Extraction, PatientSignal, PromptDirective,
    PromptIntent, TurnInput,
};
use super::errors::InterviewError;
use super::field::FieldValue;
use super::metadata::CallMetadata;
use super::phase::InterviewPhase;
use super::policy::InterviewPolicy;
use super::report::ReportSynthesizer;
use super::schema::FieldSchema;
use super::state::{CallEndReason, InterviewState};
use crate::domain::foundation::SessionId;

/// Drives a single interview session.
#[derive(Debug)]
pub struct TurnCoordinator {
    state: InterviewState,
    policy: Arc<InterviewPolicy>,
    controller: PhaseController,
    budget: QuestionBudget,
    synthesizer: ReportSynthesizer,
    last_prompt: Option<PromptDirective>,
    last_confirmation: Option<ConfirmationDirective>,
    ended: Option<EndDirective>,
}

impl TurnCoordinator {
    pub fn new(session_id: SessionId, metadata: CallMetadata, policy: Arc<InterviewPolicy>) -> Self {
        let schema = FieldSchema::standard();
        Self {
            state: InterviewState::new(session_id, metadata, schema, &policy),
            controller: PhaseController::new(schema, Arc::clone(&policy)),
            budget: QuestionBudget::new(Arc::clone(&policy)),
            synthesizer: ReportSynthesizer::new(),
            policy,
            last_prompt: None,
            last_confirmation: None,
            ended: None,
        }
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn policy(&self) -> &InterviewPolicy {
        &self.policy
    }

    pub fn is_finished(&self) -> bool {
        self.ended.is_some()
    }

    /// Issues the opening question.
    ///
    /// Calling it again returns the directive currently outstanding.
    pub fn start(&mut self) -> Directive {
        if let Some(end) = &self.ended {
            return Directive::End(end.clone());
        }
        if let Some(confirmation) = &self.last_confirmation {
            return Directive::Confirmation(confirmation.clone());
        }
        if let Some(prompt) = &self.last_prompt {
            return Directive::Prompt(prompt.clone());
        }

        tracing::info!(
            session_id = %self.state.session_id(),
            phase = %self.state.phase(),
            max_questions = self.policy.max_questions(),
            "interview started"
        );
        match self.ask() {
            Ok(directive) => directive,
            Err(err) => self.abort(err),
        }
    }

    /// Processes one patient turn.
    ///
    /// After the interview has ended, the cached end directive is returned
    /// and the input is ignored.
    pub fn handle_turn(&mut self, input: TurnInput) -> Directive {
        if let Some(end) = &self.ended {
            tracing::debug!(session_id = %self.state.session_id(), "turn after end ignored");
            return Directive::End(end.clone());
        }
        match self.process_turn(input) {
            Ok(directive) => {
                tracing::debug!(
                    session_id = %self.state.session_id(),
                    turn = self.state.turn(),
                    phase = %self.state.phase(),
                    question = self.state.questions_asked(),
                    directive = directive.kind(),
                    "turn processed"
                );
                directive
            }
            Err(err) => self.abort(err),
        }
    }

    /// Ends the interview now, for hangups, timeouts and voicemail.
    ///
    /// Produces a best-effort report from whatever was collected.
    pub fn cancel(&mut self, reason: CallEndReason) -> Directive {
        if let Some(end) = &self.ended {
            return Directive::End(end.clone());
        }
        tracing::info!(
            session_id = %self.state.session_id(),
            phase = %self.state.phase(),
            reason = %reason,
            "interview cancelled"
        );
        self.finish(reason)
    }

    fn process_turn(&mut self, input: TurnInput) -> Result<Directive, InterviewError> {
        self.state.begin_turn()?;
        let phase_before = self.state.phase();
        let mut recorded = self.record_extractions(&input.extractions)?;

        if input.signal == Some(PatientSignal::RequestedHuman) {
            tracing::info!(session_id = %self.state.session_id(), "patient asked for staff");
            return Ok(self.finish(CallEndReason::TransferRequested));
        }

        if input.signal == Some(PatientSignal::Declined) && phase_before.is_collection() {
            recorded += self.decline_primary_target()?;
        }

        let outcome = self.controller.evaluate(&mut self.state, recorded, input.signal)?;

        match self.budget.next_action_allowed(&self.state) {
            BudgetAction::End => return Ok(self.finish(CallEndReason::Completed)),
            BudgetAction::ForceWrapUp => {
                self.controller.force_wrap_up(&mut self.state)?;
                self.state.reset_clarifications();
                return self.confirm(true);
            }
            BudgetAction::Ask => {}
        }

        if self.state.phase() == InterviewPhase::Confirmation {
            return self.after_confirmation_turn(outcome);
        }

        if recorded > 0 || outcome.moved() {
            self.state.reset_clarifications();
            return self.ask();
        }
        self.clarify_or_advance()
    }

    fn after_confirmation_turn(&mut self, outcome: PhaseOutcome) -> Result<Directive, InterviewError> {
        match outcome {
            PhaseOutcome::Advanced { .. } => {
                self.state.reset_clarifications();
                self.confirm(true)
            }
            PhaseOutcome::CorrectionRequested { .. } | PhaseOutcome::CorrectionApplied { .. } => {
                self.state.reset_clarifications();
                self.confirm(false)
            }
            _ => {
                let run = self.state.record_clarification();
                if run > self.policy.max_consecutive_clarifications() {
                    tracing::info!(
                        session_id = %self.state.session_id(),
                        "no answer to the read-back, ending unconfirmed"
                    );
                    self.controller.abandon_confirmation(&mut self.state)?;
                    return Ok(self.finish(CallEndReason::Completed));
                }
                match &self.last_confirmation {
                    Some(confirmation) => Ok(Directive::Confirmation(confirmation.clone())),
                    None => self.confirm(false),
                }
            }
        }
    }

    fn clarify_or_advance(&mut self) -> Result<Directive, InterviewError> {
        let run = self.state.record_clarification();
        if run > self.policy.max_consecutive_clarifications() {
            let phase = self.controller.force_advance(&mut self.state)?;
            self.state.reset_clarifications();
            return if phase == InterviewPhase::Confirmation {
                self.confirm(true)
            } else {
                self.ask()
            };
        }

        let prompt = match &self.last_prompt {
            Some(last) if last.phase == self.state.phase() => PromptDirective {
                intent: PromptIntent::Clarify,
                ..last.clone()
            },
            _ => self.prompt_for_phase(PromptIntent::Clarify, self.state.questions_asked()),
        };
        tracing::debug!(
            session_id = %self.state.session_id(),
            phase = %prompt.phase,
            run,
            "nothing extracted, clarifying"
        );
        Ok(Directive::Prompt(prompt))
    }

    fn record_extractions(&mut self, extractions: &[Extraction]) -> Result<usize, InterviewError> {
        let mut recorded = 0;
        for extraction in extractions {
            match self.state.record_answer(&extraction.field, extraction.value.clone()) {
                Ok(()) => {
                    tracing::debug!(
                        session_id = %self.state.session_id(),
                        field_id = %extraction.field,
                        turn = self.state.turn(),
                        "field recorded"
                    );
                    recorded += 1;
                }
                Err(err) if err.is_field_level() => {
                    tracing::warn!(
                        session_id = %self.state.session_id(),
                        field_id = %extraction.field,
                        error = %err,
                        "dropping extraction"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(recorded)
    }

    /// Marks the field the last question was about as declined.
    fn decline_primary_target(&mut self) -> Result<usize, InterviewError> {
        let phase = self.state.phase();
        let target = self
            .last_prompt
            .as_ref()
            .filter(|p| p.phase == phase)
            .and_then(|p| {
                p.target_fields
                    .iter()
                    .copied()
                    .find(|id| self.state.field(id).is_some_and(|f| !f.is_filled()))
            })
            .or_else(|| self.state.unfilled_for_phase(phase).first().copied());

        match target {
            Some(field_id) => {
                self.state.record_answer(field_id, FieldValue::Declined)?;
                tracing::debug!(session_id = %self.state.session_id(), field_id, "patient declined");
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn prompt_for_phase(&self, intent: PromptIntent, question_number: u32) -> PromptDirective {
        let phase = self.state.phase();
        PromptDirective {
            phase,
            intent,
            guidance: phase.guidance(),
            target_fields: self.state.unfilled_for_phase(phase),
            question_number,
        }
    }

    fn ask(&mut self) -> Result<Directive, InterviewError> {
        let question = self.state.increment_question_count()?;
        let prompt = self.prompt_for_phase(PromptIntent::Ask, question);
        self.last_prompt = Some(prompt.clone());
        Ok(Directive::Prompt(prompt))
    }

    /// Reads the summary back. Only the first read-back counts as a
    /// question, and only while the budget has room.
    fn confirm(&mut self, first_entry: bool) -> Result<Directive, InterviewError> {
        if first_entry && self.state.questions_asked() < self.state.max_questions() {
            self.state.increment_question_count()?;
        }
        let status = self.state.confirmation();
        let confirmation = ConfirmationDirective {
            summary: self.synthesizer.confirmation_summary(&self.state),
            reentry: status.reentries(),
            awaiting_correction: status.is_correction_pending(),
        };
        self.last_confirmation = Some(confirmation.clone());
        Ok(Directive::Confirmation(confirmation))
    }

    fn abort(&mut self, err: InterviewError) -> Directive {
        match err {
            InterviewError::TerminatedInterview => {
                tracing::warn!(session_id = %self.state.session_id(), "turn on terminated interview");
            }
            ref other => {
                tracing::error!(
                    session_id = %self.state.session_id(),
                    error = %other,
                    "interview aborted"
                );
            }
        }
        self.finish(CallEndReason::SessionError)
    }

    /// Terminates (if needed) and synthesizes the report exactly once.
    fn finish(&mut self, reason: CallEndReason) -> Directive {
        if let Some(end) = &self.ended {
            return Directive::End(end.clone());
        }
        if !self.state.is_terminated() {
            if let Err(err) = self.state.terminate(reason) {
                tracing::warn!(session_id = %self.state.session_id(), error = %err, "terminate failed");
            }
        }
        let reason = self.state.end_reason().unwrap_or(reason);
        let report = self.synthesizer.render(&self.state.snapshot());
        tracing::info!(
            session_id = %self.state.session_id(),
            reason = %reason,
            status = %report.status(),
            questions = self.state.questions_asked(),
            "interview ended"
        );
        let end = EndDirective { report, reason };
        self.ended = Some(end.clone());
        Directive::End(end)
    }
}
