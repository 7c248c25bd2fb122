//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid interview policy: {0}")]
    InvalidInterviewPolicy(String),

    #[error("Invalid silence timeout")]
    InvalidSilenceTimeout,

    #[error("Report directory must not be empty")]
    EmptyReportDirectory,

    #[error("Invalid AI request timeout")]
    InvalidTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
