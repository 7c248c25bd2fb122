//! Error types for the interview engine.

use super::phase::InterviewPhase;

/// Interview engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterviewError {
    /// An extraction referenced a field outside the schema.
    #[error("Unknown field: {field_id}")]
    UnknownField { field_id: String },

    /// A mutation was attempted after the interview terminated.
    #[error("Interview already terminated")]
    TerminatedInterview,

    /// Asking another question would exceed the ceiling.
    #[error("Question budget exceeded: {asked} asked, limit is {max}")]
    BudgetExceeded { asked: u32, max: u32 },

    /// The phase state machine rejected a transition.
    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidPhaseTransition {
        from: InterviewPhase,
        to: InterviewPhase,
    },

    /// A report was requested for an interview still in progress.
    #[error("Interview has not terminated")]
    NotTerminated,
}

impl InterviewError {
    /// Creates an unknown field error.
    pub fn unknown_field(field_id: impl Into<String>) -> Self {
        Self::UnknownField {
            field_id: field_id.into(),
        }
    }

    /// Returns true for errors scoped to a single extraction.
    ///
    /// These are logged and dropped; everything else ends the session.
    pub fn is_field_level(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_displays_id() {
        assert_eq!(
            InterviewError::unknown_field("blood_type").to_string(),
            "Unknown field: blood_type"
        );
    }

    #[test]
    fn budget_exceeded_displays_counts() {
        let err = InterviewError::BudgetExceeded { asked: 20, max: 20 };
        assert_eq!(err.to_string(), "Question budget exceeded: 20 asked, limit is 20");
    }

    #[test]
    fn only_unknown_field_is_field_level() {
        assert!(InterviewError::unknown_field("x").is_field_level());
        assert!(!InterviewError::TerminatedInterview.is_field_level());
        assert!(!InterviewError::BudgetExceeded { asked: 1, max: 1 }.is_field_level());
    }
}
