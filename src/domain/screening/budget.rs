//! Question budget: keeps every interview bounded.

use std::sync::Arc;

use super::phase::InterviewPhase;
use super::policy::InterviewPolicy;
use super::state::InterviewState;

/// What the budget allows the coordinator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetAction {
    /// Keep asking in the current phase.
    Ask,
    /// Skip straight to confirmation with whatever is filled.
    ForceWrapUp,
    /// The interview is over.
    End,
}

/// Enforces the question ceiling.
#[derive(Debug, Clone)]
pub struct QuestionBudget {
    policy: Arc<InterviewPolicy>,
}

impl QuestionBudget {
    pub fn new(policy: Arc<InterviewPolicy>) -> Self {
        Self { policy }
    }

    /// Decides the next allowed action.
    ///
    /// Wrap-up is forced once `max - margin` questions have been asked while
    /// still collecting, which leaves room for the read-back.
    pub fn next_action_allowed(&self, state: &InterviewState) -> BudgetAction {
        if state.is_terminated() || state.phase() == InterviewPhase::Completed {
            return BudgetAction::End;
        }
        if state.phase().is_collection()
            && state.questions_asked() >= self.policy.wrap_up_threshold()
        {
            return BudgetAction::ForceWrapUp;
        }
        BudgetAction::Ask
    }
}
