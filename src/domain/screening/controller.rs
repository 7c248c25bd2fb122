//! Phase controller.
//!
//! Decides phase transitions from field completeness and patient signals.
//! Phases only move forward; the confirmation step loops on an explicit
//! re-entry counter.

use std::sync::Arc;

use super::directive::PatientSignal;
use super::errors::InterviewError;
use super::phase::InterviewPhase;
use super::policy::InterviewPolicy;
use super::schema::FieldSchema;
use super::state::{CallEndReason, ConfirmationStatus, InterviewState};

/// What one evaluation did to the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Still collecting in the same phase.
    Stayed,
    /// Moved forward, possibly across several complete phases.
    Advanced {
        from: InterviewPhase,
        to: InterviewPhase,
    },
    /// In confirmation with no answer to the read-back.
    AwaitingConfirmation,
    /// The patient wants something changed.
    CorrectionRequested {
        reentries: u32,
        awaiting_correction: bool,
    },
    /// The correction the patient asked for has arrived.
    CorrectionApplied { reentries: u32 },
    /// The patient confirmed; the phase is now `Completed`.
    Confirmed,
    /// Too many corrections; the interview was terminated.
    CorrectionLimitReached,
}

impl PhaseOutcome {
    /// Returns true when the phase changed during this evaluation.
    pub fn moved(&self) -> bool {
        matches!(self, Self::Advanced { .. } | Self::Confirmed)
    }
}

/// Sequences the interview phases.
#[derive(Debug, Clone)]
pub struct PhaseController {
    schema: &'static FieldSchema,
    policy: Arc<InterviewPolicy>,
}

impl PhaseController {
    pub fn new(schema: &'static FieldSchema, policy: Arc<InterviewPolicy>) -> Self {
        Self { schema, policy }
    }

    /// Evaluates the state after this turn's answers were recorded.
    ///
    /// `recorded` is the number of values written this turn.
    pub fn evaluate(
        &self,
        state: &mut InterviewState,
        recorded: usize,
        signal: Option<PatientSignal>,
    ) -> Result<PhaseOutcome, InterviewError> {
        let start = state.phase();
        match start {
            InterviewPhase::Confirmation => self.evaluate_confirmation(state, recorded, signal),
            InterviewPhase::Completed => Ok(PhaseOutcome::Stayed),
            _ => {
                let to = self.advance_while_complete(state)?;
                if to == start {
                    Ok(PhaseOutcome::Stayed)
                } else {
                    Ok(PhaseOutcome::Advanced { from: start, to })
                }
            }
        }
    }

    fn evaluate_confirmation(
        &self,
        state: &mut InterviewState,
        recorded: usize,
        signal: Option<PatientSignal>,
    ) -> Result<PhaseOutcome, InterviewError> {
        let status = state.confirmation();
        let reentries = status.reentries();

        if recorded > 0 && status.is_correction_pending() {
            state.set_confirmation(ConfirmationStatus::Awaiting {
                reentries,
                correction_pending: false,
            })?;
            return Ok(PhaseOutcome::CorrectionApplied { reentries });
        }

        if recorded == 0 && signal == Some(PatientSignal::Confirmed) {
            state.advance_to(InterviewPhase::Completed)?;
            state.set_confirmation(ConfirmationStatus::Confirmed)?;
            tracing::info!(session_id = %state.session_id(), "summary confirmed");
            return Ok(PhaseOutcome::Confirmed);
        }

        if recorded > 0 || signal == Some(PatientSignal::Declined) {
            state.record_correction_request();
            let next = reentries.saturating_add(1);
            if next > self.policy.max_correction_reentries() {
                tracing::warn!(
                    session_id = %state.session_id(),
                    reentries,
                    "correction limit reached, ending interview"
                );
                state.set_confirmation(ConfirmationStatus::CorrectionLimitReached)?;
                state.terminate(CallEndReason::Completed)?;
                return Ok(PhaseOutcome::CorrectionLimitReached);
            }

            let awaiting_correction = recorded == 0;
            state.set_confirmation(ConfirmationStatus::Awaiting {
                reentries: next,
                correction_pending: awaiting_correction,
            })?;
            tracing::debug!(session_id = %state.session_id(), reentry = next, "re-entering confirmation");
            return Ok(PhaseOutcome::CorrectionRequested {
                reentries: next,
                awaiting_correction,
            });
        }

        Ok(PhaseOutcome::AwaitingConfirmation)
    }

    /// Skips to confirmation, marking every unfilled required field
    /// `NotAssessed`.
    pub fn force_wrap_up(&self, state: &mut InterviewState) -> Result<Vec<&'static str>, InterviewError> {
        let marked = state.mark_not_assessed(&InterviewPhase::COLLECTION)?;
        tracing::info!(
            session_id = %state.session_id(),
            phase = %state.phase(),
            questions = state.questions_asked(),
            not_assessed = marked.len(),
            "question budget nearly spent, wrapping up"
        );
        state.advance_to(InterviewPhase::Confirmation)?;
        self.enter_confirmation(state)?;
        Ok(marked)
    }

    /// Gives up on a stalled phase: its unfilled required fields become
    /// `NotAssessed` and the interview moves on.
    pub fn force_advance(&self, state: &mut InterviewState) -> Result<InterviewPhase, InterviewError> {
        let stalled = state.phase();
        if !stalled.is_collection() {
            return Ok(stalled);
        }
        let marked = state.mark_not_assessed(&[stalled])?;
        tracing::info!(
            session_id = %state.session_id(),
            phase = %stalled,
            not_assessed = marked.len(),
            "phase stalled on clarifications, moving on"
        );
        self.advance_while_complete(state)
    }

    /// Ends an unanswered read-back.
    pub fn abandon_confirmation(&self, state: &mut InterviewState) -> Result<(), InterviewError> {
        state.set_confirmation(ConfirmationStatus::NotObtained)?;
        state.terminate(CallEndReason::Completed)
    }

    fn advance_while_complete(&self, state: &mut InterviewState) -> Result<InterviewPhase, InterviewError> {
        let mut current = state.phase();
        while current.is_collection() && self.schema.is_phase_complete(state, current) {
            let next = self.policy.next_phase(current);
            state.advance_to(next)?;
            tracing::debug!(session_id = %state.session_id(), from = %current, to = %next, "phase advanced");
            current = next;
        }
        if current == InterviewPhase::Confirmation {
            self.enter_confirmation(state)?;
        }
        Ok(current)
    }

    fn enter_confirmation(&self, state: &mut InterviewState) -> Result<(), InterviewError> {
        state.set_confirmation(ConfirmationStatus::Awaiting {
            reentries: 0,
            correction_pending: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::field::FieldValue;
    use crate::domain::screening::schema::field_ids::*;
    use crate::domain::screening::test_support::new_state;

    fn controller() -> PhaseController {
        PhaseController::new(FieldSchema::standard(), Arc::new(InterviewPolicy::default()))
    }

    fn fill(state: &mut InterviewState, ids: &[&str]) {
        for id in ids {
            state.record_answer(id, FieldValue::stated("answer")).unwrap();
        }
    }

    fn in_confirmation() -> InterviewState {
        let mut state = new_state();
        controller().force_wrap_up(&mut state).unwrap();
        state
    }

    mod collection {
        use super::*;

        #[test]
        fn incomplete_phase_stays() {
            let mut state = new_state();
            fill(&mut state, &[PATIENT_NAME]);
            assert_eq!(controller().evaluate(&mut state, 1, None).unwrap(), PhaseOutcome::Stayed);
            assert_eq!(state.phase(), InterviewPhase::Identification);
        }

        #[test]
        fn complete_phase_advances() {
            let mut state = new_state();
            fill(&mut state, &[PATIENT_NAME, APPOINTMENT_DATE]);
            let outcome = controller().evaluate(&mut state, 2, None).unwrap();
            assert_eq!(
                outcome,
                PhaseOutcome::Advanced {
                    from: InterviewPhase::Identification,
                    to: InterviewPhase::Hpi
                }
            );
        }

        #[test]
        fn volunteered_answers_cross_several_phases() {
            let mut state = new_state();
            fill(&mut state, &[PATIENT_NAME, APPOINTMENT_DATE]);
            fill(&mut state, &FieldSchema::standard().required_for_phase(InterviewPhase::Hpi));
            fill(&mut state, &[MEDICAL_HISTORY, MEDICATIONS, ALLERGIES]);

            controller().evaluate(&mut state, 12, None).unwrap();
            assert_eq!(state.phase(), InterviewPhase::FamilySocial);
        }

        #[test]
        fn last_phase_complete_enters_confirmation() {
            let mut state = new_state();
            for phase in InterviewPhase::COLLECTION {
                fill(&mut state, &FieldSchema::standard().required_for_phase(phase));
            }
            controller().evaluate(&mut state, 1, None).unwrap();
            assert_eq!(state.phase(), InterviewPhase::Confirmation);
            assert_eq!(
                state.confirmation(),
                ConfirmationStatus::Awaiting {
                    reentries: 0,
                    correction_pending: false
                }
            );
        }

        #[test]
        fn force_advance_marks_stalled_phase_and_moves_one_step() {
            let mut state = new_state();
            state.advance_to(InterviewPhase::Hpi).unwrap();
            fill(&mut state, &[CHIEF_COMPLAINT]);

            let phase = controller().force_advance(&mut state).unwrap();

            assert_eq!(phase, InterviewPhase::HistoryMedications);
            assert_eq!(state.field(ONSET).unwrap().value(), Some(&FieldValue::NotAssessed));
            assert!(!state.field(MEDICATIONS).unwrap().is_filled());
        }

        #[test]
        fn force_wrap_up_jumps_to_confirmation() {
            let mut state = new_state();
            state.advance_to(InterviewPhase::Hpi).unwrap();
            fill(&mut state, &[PATIENT_NAME, APPOINTMENT_DATE, CHIEF_COMPLAINT]);

            let marked = controller().force_wrap_up(&mut state).unwrap();

            assert_eq!(state.phase(), InterviewPhase::Confirmation);
            assert!(marked.contains(&ONSET));
            assert!(marked.contains(&SOCIAL_HISTORY));
            assert!(!marked.contains(&CHIEF_COMPLAINT));
        }
    }

    mod confirmation {
        use super::*;

        #[test]
        fn explicit_yes_completes() {
            let mut state = in_confirmation();
            let outcome = controller()
                .evaluate(&mut state, 0, Some(PatientSignal::Confirmed))
                .unwrap();
            assert_eq!(outcome, PhaseOutcome::Confirmed);
            assert_eq!(state.phase(), InterviewPhase::Completed);
            assert_eq!(state.confirmation(), ConfirmationStatus::Confirmed);
        }

        #[test]
        fn silence_keeps_waiting() {
            let mut state = in_confirmation();
            assert_eq!(
                controller().evaluate(&mut state, 0, None).unwrap(),
                PhaseOutcome::AwaitingConfirmation
            );
        }

        #[test]
        fn inline_correction_reenters() {
            let mut state = in_confirmation();
            let outcome = controller().evaluate(&mut state, 1, None).unwrap();
            assert_eq!(
                outcome,
                PhaseOutcome::CorrectionRequested {
                    reentries: 1,
                    awaiting_correction: false
                }
            );
            assert_eq!(state.phase(), InterviewPhase::Confirmation);
        }

        #[test]
        fn decline_then_value_uses_one_reentry() {
            let mut state = in_confirmation();
            let c = controller();
            assert_eq!(
                c.evaluate(&mut state, 0, Some(PatientSignal::Declined)).unwrap(),
                PhaseOutcome::CorrectionRequested {
                    reentries: 1,
                    awaiting_correction: true
                }
            );
            assert_eq!(
                c.evaluate(&mut state, 1, None).unwrap(),
                PhaseOutcome::CorrectionApplied { reentries: 1 }
            );
            assert_eq!(state.confirmation().reentries(), 1);
        }

        #[test]
        fn fourth_correction_terminates() {
            let mut state = in_confirmation();
            let c = controller();
            for expected in 1..=3 {
                let outcome = c.evaluate(&mut state, 1, None).unwrap();
                assert_eq!(
                    outcome,
                    PhaseOutcome::CorrectionRequested {
                        reentries: expected,
                        awaiting_correction: false
                    }
                );
            }
            assert_eq!(
                c.evaluate(&mut state, 1, None).unwrap(),
                PhaseOutcome::CorrectionLimitReached
            );
            assert!(state.is_terminated());
            assert_eq!(state.confirmation(), ConfirmationStatus::CorrectionLimitReached);
            assert_eq!(state.end_reason(), Some(CallEndReason::Completed));
        }

        #[test]
        fn abandon_records_missing_confirmation() {
            let mut state = in_confirmation();
            controller().abandon_confirmation(&mut state).unwrap();
            assert!(state.is_terminated());
            assert_eq!(state.confirmation(), ConfirmationStatus::NotObtained);
        }
    }
}
