//! Validated transitions for lifecycle enums.

use super::ValidationError;

/// A lifecycle enum with a fixed transition table.
///
/// Implementors list their legal successors; `transition_to` checks a move
/// against that list.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Legal successors of this state.
    fn valid_transitions(&self) -> Vec<Self>;

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// A state with no successors.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
