//! Application handlers.
//!
//! Command and query handlers that orchestrate the interview engine and ports.

pub mod screening;

pub use screening::{
    CancelSignal, ListReportsHandler, ListReportsQuery, RunScreeningCallCommand,
    RunScreeningCallError, RunScreeningCallHandler, RunScreeningCallResult,
};
