//! Pre-visit Screening - Automated patient intake calls
//!
//! This crate runs short, bounded screening interviews before a clinic
//! visit and turns each call into a structured plain-text report.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
