//! Screening interview engine.
//!
//! A bounded dialogue state machine for pre-visit screening calls. The
//! engine never understands language itself: a reasoning collaborator
//! extracts fields from each utterance, and the engine decides what to ask
//! next, when to wrap up, and what goes into the final report.
//!
//! # Components
//!
//! - `schema` - Static field table and phase completeness
//! - `state` - Mutable per-call record and its snapshots
//! - `controller` - Phase sequencing and the confirmation loop
//! - `budget` - Question ceiling and forced wrap-up
//! - `report` - Canonical report text
//! - `coordinator` - One conversational turn end to end

mod budget;
mod controller;
mod coordinator;
mod directive;
mod errors;
mod field;
mod metadata;
mod phase;
mod policy;
mod report;
mod schema;
mod state;

pub use budget::{BudgetAction, QuestionBudget};
pub use controller::{PhaseController, PhaseOutcome};
pub use coordinator::TurnCoordinator;
pub use directive::{
    ConfirmationDirective, Directive, EndDirective, Extraction, PatientSignal, PromptDirective,
    PromptIntent, TurnInput,
};
pub use errors::InterviewError;
pub use field::{
    Field, FieldCategory, FieldDefinition, FieldValue, NONE_REPORTED, NOT_ASSESSED,
    PATIENT_DECLINED,
};
pub use metadata::{CallMetadata, CallPriority};
pub use phase::InterviewPhase;
pub use policy::{
    InterviewPolicy, DEFAULT_MAX_CONSECUTIVE_CLARIFICATIONS, DEFAULT_MAX_CORRECTION_REENTRIES,
    DEFAULT_MAX_QUESTIONS, DEFAULT_WRAP_UP_MARGIN, MAX_RETRY_CAP,
};
pub use report::{Completeness, Report, ReportHeadline, ReportStatus, ReportSynthesizer};
pub use schema::{field_ids, FieldSchema};
pub use state::{CallEndReason, ConfirmationStatus, InterviewSnapshot, InterviewState};
