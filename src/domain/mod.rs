//! Domain layer containing the interview engine and its primitives.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `screening` - Pre-visit screening interview engine

pub mod foundation;
pub mod screening;
