//! Interview state: the mutable record of one call session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use super::errors::InterviewError;
use super::field::{Field, FieldValue};
use super::metadata::CallMetadata;
use super::phase::InterviewPhase;
use super::policy::InterviewPolicy;
use super::schema::FieldSchema;
use crate::domain::foundation::{SessionId, StateMachine, Timestamp};

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEndReason {
    /// The interview ran to its end.
    Completed,
    /// The patient hung up.
    Hangup,
    /// The transport's session timeout fired.
    Timeout,
    /// An answering machine picked up.
    Voicemail,
    /// The patient asked for a human.
    TransferRequested,
    /// An internal error ended the session.
    SessionError,
}

impl CallEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Hangup => "hangup",
            Self::Timeout => "timeout",
            Self::Voicemail => "voicemail",
            Self::TransferRequested => "transfer_requested",
            Self::SessionError => "session_error",
        }
    }

    /// Returns true when the transport cut the call short.
    pub fn is_early_disconnect(&self) -> bool {
        matches!(self, Self::Hangup | Self::Timeout | Self::Voicemail)
    }
}

impl fmt::Display for CallEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the read-back step.
///
/// Re-entries are an explicit counter, never recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// Confirmation has not been reached.
    #[default]
    NotStarted,
    /// Summary read back; waiting for a yes or a correction.
    ///
    /// `correction_pending` is set when the patient asked to correct
    /// something but has not yet said what.
    Awaiting {
        reentries: u32,
        correction_pending: bool,
    },
    /// The patient confirmed the summary.
    Confirmed,
    /// Corrections kept coming past the re-entry cap.
    CorrectionLimitReached,
    /// The patient never answered the read-back.
    NotObtained,
}

impl ConfirmationStatus {
    /// Re-entry count while awaiting, zero otherwise.
    pub fn reentries(&self) -> u32 {
        match self {
            Self::Awaiting { reentries, .. } => *reentries,
            _ => 0,
        }
    }

    pub fn is_correction_pending(&self) -> bool {
        matches!(
            self,
            Self::Awaiting {
                correction_pending: true,
                ..
            }
        )
    }
}

/// Mutable record of one interview.
///
/// Owned exclusively by one session. Once terminated, every mutating
/// operation fails with [`InterviewError::TerminatedInterview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewState {
    session_id: SessionId,
    metadata: CallMetadata,
    fields: Vec<Field>,
    phase: InterviewPhase,
    questions_asked: u32,
    max_questions: u32,
    turn: u32,
    terminated: bool,
    end_reason: Option<CallEndReason>,
    confirmation: ConfirmationStatus,
    corrections_requested: u32,
    consecutive_clarifications: u32,
    clarifications_total: u32,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
}

impl InterviewState {
    /// Creates a fresh state with every schema field empty.
    pub fn new(
        session_id: SessionId,
        metadata: CallMetadata,
        schema: &FieldSchema,
        policy: &InterviewPolicy,
    ) -> Self {
        Self {
            session_id,
            metadata,
            fields: schema.definitions().iter().copied().map(Field::new).collect(),
            phase: policy.initial_phase(),
            questions_asked: 0,
            max_questions: policy.max_questions(),
            turn: 0,
            terminated: false,
            end_reason: None,
            confirmation: ConfirmationStatus::NotStarted,
            corrections_requested: 0,
            consecutive_clarifications: 0,
            clarifications_total: 0,
            started_at: Timestamp::now(),
            ended_at: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    /// All fields in schema order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == field_id)
    }

    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    /// Index of the current patient turn (0 before the first answer).
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn end_reason(&self) -> Option<CallEndReason> {
        self.end_reason
    }

    pub fn confirmation(&self) -> ConfirmationStatus {
        self.confirmation
    }

    /// Corrections requested at the read-back, including the one that hit
    /// the limit.
    pub fn corrections_requested(&self) -> u32 {
        self.corrections_requested
    }

    pub fn consecutive_clarifications(&self) -> u32 {
        self.consecutive_clarifications
    }

    pub fn clarifications_total(&self) -> u32 {
        self.clarifications_total
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    /// Unfilled fields of a phase, required ones first, schema order within.
    pub fn unfilled_for_phase(&self, phase: InterviewPhase) -> Vec<&'static str> {
        let (mut required, optional): (Vec<_>, Vec<_>) = self
            .fields
            .iter()
            .filter(|f| f.definition().phase == phase && !f.is_filled())
            .partition(|f| f.definition().required);
        required.extend(optional);
        required.into_iter().map(Field::id).collect()
    }

    // ═══════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════

    fn ensure_active(&self) -> Result<(), InterviewError> {
        if self.terminated {
            Err(InterviewError::TerminatedInterview)
        } else {
            Ok(())
        }
    }

    /// Starts the next patient turn and returns its index.
    pub fn begin_turn(&mut self) -> Result<u32, InterviewError> {
        self.ensure_active()?;
        self.turn += 1;
        Ok(self.turn)
    }

    /// Records a value for a field, overwriting any earlier value.
    ///
    /// The source turn is the current turn.
    pub fn record_answer(&mut self, field_id: &str, value: FieldValue) -> Result<(), InterviewError> {
        self.ensure_active()?;
        let turn = self.turn;
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id() == field_id)
            .ok_or_else(|| InterviewError::unknown_field(field_id))?;
        field.set(value, turn);
        Ok(())
    }

    /// Counts one more question against the budget.
    pub fn increment_question_count(&mut self) -> Result<u32, InterviewError> {
        self.ensure_active()?;
        if self.questions_asked >= self.max_questions {
            return Err(InterviewError::BudgetExceeded {
                asked: self.questions_asked,
                max: self.max_questions,
            });
        }
        self.questions_asked += 1;
        Ok(self.questions_asked)
    }

    /// Moves to a later phase, validated by the phase state machine.
    pub fn advance_to(&mut self, target: InterviewPhase) -> Result<(), InterviewError> {
        self.ensure_active()?;
        let from = self.phase;
        self.phase = from
            .transition_to(target)
            .map_err(|_| InterviewError::InvalidPhaseTransition { from, to: target })?;
        Ok(())
    }

    /// Marks every unfilled required field of the given phases `NotAssessed`.
    ///
    /// Returns the ids that were marked.
    pub fn mark_not_assessed(
        &mut self,
        phases: &[InterviewPhase],
    ) -> Result<Vec<&'static str>, InterviewError> {
        self.ensure_active()?;
        let turn = self.turn;
        let mut marked = Vec::new();
        for field in self.fields.iter_mut().filter(|f| {
            f.definition().required && !f.is_filled() && phases.contains(&f.definition().phase)
        }) {
            field.set(FieldValue::NotAssessed, turn);
            marked.push(field.id());
        }
        Ok(marked)
    }

    pub(crate) fn set_confirmation(&mut self, status: ConfirmationStatus) -> Result<(), InterviewError> {
        self.ensure_active()?;
        self.confirmation = status;
        Ok(())
    }

    pub(crate) fn record_correction_request(&mut self) {
        self.corrections_requested += 1;
    }

    /// Counts a clarification and returns the consecutive run length.
    pub(crate) fn record_clarification(&mut self) -> u32 {
        self.consecutive_clarifications += 1;
        self.clarifications_total += 1;
        self.consecutive_clarifications
    }

    pub(crate) fn reset_clarifications(&mut self) {
        self.consecutive_clarifications = 0;
    }

    /// Ends the interview. No field may change afterwards.
    pub fn terminate(&mut self, reason: CallEndReason) -> Result<(), InterviewError> {
        self.ensure_active()?;
        self.terminated = true;
        self.end_reason = Some(reason);
        self.ended_at = Some(Timestamp::now());
        Ok(())
    }

    /// Deep copy for report synthesis.
    pub fn snapshot(&self) -> InterviewSnapshot {
        InterviewSnapshot(self.clone())
    }
}

/// Read-only copy of an [`InterviewState`].
///
/// Owns its data, so later mutation of the live state never reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewSnapshot(InterviewState);

impl Deref for InterviewSnapshot {
    type Target = InterviewState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::schema::field_ids::*;
    use crate::domain::screening::test_support::new_state;

    mod record_answer {
        use super::*;

        #[test]
        fn sets_value_and_source_turn() {
            let mut state = new_state();
            state.begin_turn().unwrap();
            state.begin_turn().unwrap();
            state.record_answer(ONSET, FieldValue::stated("two days ago")).unwrap();

            let field = state.field(ONSET).unwrap();
            assert_eq!(field.value(), Some(&FieldValue::stated("two days ago")));
            assert_eq!(field.source_turn(), Some(2));
        }

        #[test]
        fn correction_overwrites_value_and_turn() {
            let mut state = new_state();
            state.begin_turn().unwrap();
            state.record_answer(SEVERITY, FieldValue::stated("4 out of 10")).unwrap();
            state.begin_turn().unwrap();
            state.record_answer(SEVERITY, FieldValue::stated("7 out of 10")).unwrap();

            let field = state.field(SEVERITY).unwrap();
            assert_eq!(field.value(), Some(&FieldValue::stated("7 out of 10")));
            assert_eq!(field.source_turn(), Some(2));
        }

        #[test]
        fn unknown_field_is_rejected() {
            let mut state = new_state();
            let err = state.record_answer("blood_type", FieldValue::stated("O+")).unwrap_err();
            assert_eq!(err, InterviewError::unknown_field("blood_type"));
        }

        #[test]
        fn terminated_state_rejects_answers() {
            let mut state = new_state();
            state.record_answer(SEVERITY, FieldValue::stated("4 out of 10")).unwrap();
            state.terminate(CallEndReason::Hangup).unwrap();

            let err = state.record_answer(SEVERITY, FieldValue::stated("7")).unwrap_err();
            assert_eq!(err, InterviewError::TerminatedInterview);
            assert_eq!(
                state.field(SEVERITY).unwrap().value(),
                Some(&FieldValue::stated("4 out of 10"))
            );
        }

        #[test]
        fn terminated_check_precedes_unknown_field() {
            let mut state = new_state();
            state.terminate(CallEndReason::Completed).unwrap();
            assert_eq!(
                state.record_answer("blood_type", FieldValue::Declined),
                Err(InterviewError::TerminatedInterview)
            );
        }
    }

    mod question_budget {
        use super::*;

        #[test]
        fn counts_up_to_the_ceiling() {
            let mut state = new_state();
            for expected in 1..=20 {
                assert_eq!(state.increment_question_count().unwrap(), expected);
            }
            assert_eq!(
                state.increment_question_count(),
                Err(InterviewError::BudgetExceeded { asked: 20, max: 20 })
            );
            assert_eq!(state.questions_asked(), 20);
        }
    }

    mod phases {
        use super::*;

        #[test]
        fn advance_follows_state_machine() {
            let mut state = new_state();
            state.advance_to(InterviewPhase::Hpi).unwrap();
            assert_eq!(state.phase(), InterviewPhase::Hpi);
        }

        #[test]
        fn backward_move_is_rejected() {
            let mut state = new_state();
            state.advance_to(InterviewPhase::Hpi).unwrap();
            assert_eq!(
                state.advance_to(InterviewPhase::Identification),
                Err(InterviewError::InvalidPhaseTransition {
                    from: InterviewPhase::Hpi,
                    to: InterviewPhase::Identification,
                })
            );
        }

        #[test]
        fn mark_not_assessed_only_touches_unfilled_required_fields() {
            let mut state = new_state();
            state.record_answer(CHIEF_COMPLAINT, FieldValue::stated("headache")).unwrap();

            let marked = state.mark_not_assessed(&[InterviewPhase::Hpi]).unwrap();

            assert!(marked.contains(&ONSET));
            assert!(!marked.contains(&CHIEF_COMPLAINT));
            assert!(!marked.contains(&ADDITIONAL_SYMPTOMS));
            assert_eq!(state.field(ONSET).unwrap().value(), Some(&FieldValue::NotAssessed));
            assert!(!state.field(ADDITIONAL_SYMPTOMS).unwrap().is_filled());
        }

        #[test]
        fn unfilled_lists_required_before_optional() {
            let state = new_state();
            assert_eq!(
                state.unfilled_for_phase(InterviewPhase::Identification),
                vec![PATIENT_NAME, APPOINTMENT_DATE, EMERGENCY_CONTACT]
            );
        }
    }

    mod termination {
        use super::*;

        #[test]
        fn terminate_records_reason_and_end_time() {
            let mut state = new_state();
            state.terminate(CallEndReason::Voicemail).unwrap();
            assert!(state.is_terminated());
            assert_eq!(state.end_reason(), Some(CallEndReason::Voicemail));
            assert!(state.ended_at().is_some());
        }

        #[test]
        fn second_terminate_fails() {
            let mut state = new_state();
            state.terminate(CallEndReason::Hangup).unwrap();
            assert_eq!(
                state.terminate(CallEndReason::Completed),
                Err(InterviewError::TerminatedInterview)
            );
            assert_eq!(state.end_reason(), Some(CallEndReason::Hangup));
        }

        #[test]
        fn early_disconnect_reasons() {
            assert!(CallEndReason::Hangup.is_early_disconnect());
            assert!(CallEndReason::Voicemail.is_early_disconnect());
            assert!(!CallEndReason::TransferRequested.is_early_disconnect());
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn later_mutation_does_not_reach_snapshot() {
            let mut state = new_state();
            state.record_answer(ALLERGIES, FieldValue::NoneReported).unwrap();
            let snapshot = state.snapshot();

            state.record_answer(ALLERGIES, FieldValue::stated("latex")).unwrap();
            state.increment_question_count().unwrap();

            assert_eq!(snapshot.field(ALLERGIES).unwrap().value(), Some(&FieldValue::NoneReported));
            assert_eq!(snapshot.questions_asked(), 0);
        }
    }
}
