//! Screening call handlers.

mod list_reports;
mod run_screening_call;

pub use list_reports::{ListReportsHandler, ListReportsQuery};
pub use run_screening_call::{
    CancelSignal, RunScreeningCallCommand, RunScreeningCallError, RunScreeningCallHandler,
    RunScreeningCallResult,
};
