//! Interview policy: the immutable limits a session runs under.

use super::phase::InterviewPhase;
use crate::domain::foundation::ValidationError;

/// Default question ceiling per call.
pub const DEFAULT_MAX_QUESTIONS: u32 = 20;

/// Default distance from the ceiling at which wrap-up is forced.
pub const DEFAULT_WRAP_UP_MARGIN: u32 = 2;

/// Default number of times the confirmation step may be re-entered.
pub const DEFAULT_MAX_CORRECTION_REENTRIES: u32 = 3;

/// Default number of back-to-back clarifications before forcing progress.
pub const DEFAULT_MAX_CONSECUTIVE_CLARIFICATIONS: u32 = 2;

/// Upper bound for the re-entry and clarification caps. Keeps every
/// interview finite.
pub const MAX_RETRY_CAP: u32 = 10;

/// Limits and phase ordering for one interview session.
///
/// Built once at session construction and never mutated, so sessions can
/// run side by side with different policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewPolicy {
    max_questions: u32,
    wrap_up_margin: u32,
    max_correction_reentries: u32,
    max_consecutive_clarifications: u32,
    phase_order: Vec<InterviewPhase>,
}

impl Default for InterviewPolicy {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            wrap_up_margin: DEFAULT_WRAP_UP_MARGIN,
            max_correction_reentries: DEFAULT_MAX_CORRECTION_REENTRIES,
            max_consecutive_clarifications: DEFAULT_MAX_CONSECUTIVE_CLARIFICATIONS,
            phase_order: InterviewPhase::COLLECTION.to_vec(),
        }
    }
}

impl InterviewPolicy {
    /// Creates a validated policy.
    pub fn new(
        max_questions: u32,
        wrap_up_margin: u32,
        max_correction_reentries: u32,
        max_consecutive_clarifications: u32,
        phase_order: Vec<InterviewPhase>,
    ) -> Result<Self, ValidationError> {
        let policy = Self {
            max_questions,
            wrap_up_margin,
            max_correction_reentries,
            max_consecutive_clarifications,
            phase_order,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks the limits are usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_questions == 0 || self.max_questions > 100 {
            return Err(ValidationError::out_of_range(
                "max_questions",
                1,
                100,
                self.max_questions as i32,
            ));
        }
        if self.wrap_up_margin >= self.max_questions {
            return Err(ValidationError::out_of_range(
                "wrap_up_margin",
                0,
                self.max_questions as i32 - 1,
                self.wrap_up_margin as i32,
            ));
        }
        for (field, value) in [
            ("max_correction_reentries", self.max_correction_reentries),
            ("max_consecutive_clarifications", self.max_consecutive_clarifications),
        ] {
            if value > MAX_RETRY_CAP {
                return Err(ValidationError::out_of_range(
                    field,
                    0,
                    MAX_RETRY_CAP as i32,
                    value.min(i32::MAX as u32) as i32,
                ));
            }
        }
        if self.phase_order.is_empty() {
            return Err(ValidationError::empty_field("phase_order"));
        }
        if self.phase_order.iter().any(|p| !p.is_collection()) {
            return Err(ValidationError::invalid_format(
                "phase_order",
                "only collection phases may be listed",
            ));
        }
        if self.phase_order.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ValidationError::invalid_format(
                "phase_order",
                "phases must be listed once each, in forward order",
            ));
        }
        Ok(())
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    pub fn wrap_up_margin(&self) -> u32 {
        self.wrap_up_margin
    }

    /// Question count at which the budget forces a wrap-up.
    pub fn wrap_up_threshold(&self) -> u32 {
        self.max_questions - self.wrap_up_margin
    }

    pub fn max_correction_reentries(&self) -> u32 {
        self.max_correction_reentries
    }

    pub fn max_consecutive_clarifications(&self) -> u32 {
        self.max_consecutive_clarifications
    }

    /// Collection phases this session walks through, in order.
    pub fn phase_order(&self) -> &[InterviewPhase] {
        &self.phase_order
    }

    /// First phase of the interview.
    pub fn initial_phase(&self) -> InterviewPhase {
        self.phase_order
            .first()
            .copied()
            .unwrap_or(InterviewPhase::Confirmation)
    }

    /// Phase that follows `current` under this policy.
    ///
    /// After the last collection phase comes `Confirmation`, then `Completed`.
    pub fn next_phase(&self, current: InterviewPhase) -> InterviewPhase {
        match current {
            InterviewPhase::Confirmation | InterviewPhase::Completed => InterviewPhase::Completed,
            _ => self
                .phase_order
                .iter()
                .copied()
                .find(|p| *p > current)
                .unwrap_or(InterviewPhase::Confirmation),
        }
    }
}
