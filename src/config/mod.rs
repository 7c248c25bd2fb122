//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `PREVISIT` prefix and
//! `__` between nested keys. Every section has defaults, so an empty
//! environment yields a working offline configuration.
//!
//! # Example
//!
//! ```no_run
//! use previsit_screening::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Reports go to {}", config.reports.directory);
//! ```

mod ai;
mod error;
mod interview;
mod reports;
mod telemetry;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use interview::InterviewConfig;
pub use reports::ReportsConfig;
pub use telemetry::{LogFormat, TelemetryConfig};

use secrecy::Secret;
use serde::Deserialize;

/// Unprefixed variable accepted for the Gemini key.
const GEMINI_KEY_FALLBACK_VAR: &str = "GEMINI_API_KEY";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Interview limits
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Report storage
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Gemini provider
    #[serde(default)]
    pub ai: AiConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PREVISIT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Falls back to `GEMINI_API_KEY` when no prefixed key is set
    ///
    /// # Environment Variable Format
    ///
    /// - `PREVISIT__INTERVIEW__MAX_QUESTIONS=20` -> `interview.max_questions = 20`
    /// - `PREVISIT__AI__GEMINI_API_KEY=...` -> `ai.gemini_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PREVISIT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if !config.ai.has_gemini() {
            if let Ok(key) = std::env::var(GEMINI_KEY_FALLBACK_VAR) {
                config.ai.gemini_api_key = Some(Secret::new(key));
            }
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.interview.validate()?;
        self.reports.validate()?;
        self.ai.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}
