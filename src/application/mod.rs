//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer runs calls end to end and answers queries about stored
//! reports, coordinating the interview engine with the ports.

pub mod handlers;

pub use handlers::{
    CancelSignal, ListReportsHandler, ListReportsQuery, RunScreeningCallCommand,
    RunScreeningCallError, RunScreeningCallHandler, RunScreeningCallResult,
};
