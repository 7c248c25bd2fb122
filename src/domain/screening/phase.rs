//! Interview phases.
//!
//! Each phase covers one category of clinical data. Phases only move
//! forward; the confirmation re-entry loop is tracked separately and never
//! changes the phase index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The stage of a screening interview.
///
/// The standard order is:
/// `Identification` → `Hpi` → `HistoryMedications` → `FamilySocial` →
/// `Confirmation` → `Completed`.
///
/// Any collection phase may jump straight to `Confirmation` when the question
/// budget forces a wrap-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    /// Confirming who we are talking to and which appointment this is.
    #[default]
    Identification,

    /// History of present illness: chief complaint plus OPQRST.
    Hpi,

    /// Past medical history, current medications and allergies.
    HistoryMedications,

    /// Family and social history.
    FamilySocial,

    /// Reading the summary back and collecting corrections.
    Confirmation,

    /// Interview finished; no further input is accepted.
    Completed,
}

impl InterviewPhase {
    /// Phases during which clinical fields are collected, in standard order.
    pub const COLLECTION: [InterviewPhase; 4] = [
        InterviewPhase::Identification,
        InterviewPhase::Hpi,
        InterviewPhase::HistoryMedications,
        InterviewPhase::FamilySocial,
    ];

    /// Position in the standard ordering.
    pub fn index(&self) -> usize {
        match self {
            Self::Identification => 0,
            Self::Hpi => 1,
            Self::HistoryMedications => 2,
            Self::FamilySocial => 3,
            Self::Confirmation => 4,
            Self::Completed => 5,
        }
    }

    /// Returns true for the four phases that gather clinical fields.
    pub fn is_collection(&self) -> bool {
        self.index() < Self::Confirmation.index()
    }

    /// Guidance for the reasoning collaborator while in this phase.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Identification => {
                "Greet briefly. Confirm the patient's name and the appointment date."
            }
            Self::Hpi => {
                "Ask about the main reason for the visit, then onset, provocation, quality, radiation, severity and timing."
            }
            Self::HistoryMedications => {
                "Ask about past medical history, current medications and any allergies."
            }
            Self::FamilySocial => {
                "Ask about relevant family history and social history. Offer a chance to add anything else."
            }
            Self::Confirmation => {
                "Read the summary back and ask the patient to confirm it or correct it."
            }
            Self::Completed => "Thank the patient and close the call.",
        }
    }

    /// Display label used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identification => "Identification",
            Self::Hpi => "HPI",
            Self::HistoryMedications => "History and Medications",
            Self::FamilySocial => "Family and Social History",
            Self::Confirmation => "Confirmation",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl StateMachine for InterviewPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use InterviewPhase::*;
        match self {
            Identification => vec![Hpi, HistoryMedications, FamilySocial, Confirmation],
            Hpi => vec![HistoryMedications, FamilySocial, Confirmation],
            HistoryMedications => vec![FamilySocial, Confirmation],
            FamilySocial => vec![Confirmation],
            Confirmation => vec![Completed],
            Completed => vec![],
        }
    }
}
