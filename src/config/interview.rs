//! Interview policy configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::screening::{
    InterviewPhase, InterviewPolicy, DEFAULT_MAX_CONSECUTIVE_CLARIFICATIONS,
    DEFAULT_MAX_CORRECTION_REENTRIES, DEFAULT_MAX_QUESTIONS, DEFAULT_WRAP_UP_MARGIN,
};

/// Limits applied to every call
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Question ceiling per call
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,

    /// Wrap-up is forced this many questions before the ceiling
    #[serde(default = "default_wrap_up_margin")]
    pub wrap_up_margin: u32,

    /// Times the confirmation step may be re-entered for corrections
    #[serde(default = "default_max_correction_reentries")]
    pub max_correction_reentries: u32,

    /// Back-to-back clarifications before the engine moves on
    #[serde(default = "default_max_consecutive_clarifications")]
    pub max_consecutive_clarifications: u32,

    /// Seconds of patient silence before the call ends (0 disables)
    #[serde(default = "default_silence_timeout")]
    pub silence_timeout_secs: u64,
}

impl InterviewConfig {
    /// Builds the immutable policy the engine runs under.
    pub fn to_policy(&self) -> Result<InterviewPolicy, ValidationError> {
        InterviewPolicy::new(
            self.max_questions,
            self.wrap_up_margin,
            self.max_correction_reentries,
            self.max_consecutive_clarifications,
            InterviewPhase::COLLECTION.to_vec(),
        )
        .map_err(|e| ValidationError::InvalidInterviewPolicy(e.to_string()))
    }

    /// Silence timeout, if enabled
    pub fn silence_timeout(&self) -> Option<Duration> {
        (self.silence_timeout_secs > 0).then(|| Duration::from_secs(self.silence_timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_policy()?;
        if self.silence_timeout_secs > 600 {
            return Err(ValidationError::InvalidSilenceTimeout);
        }
        Ok(())
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            wrap_up_margin: default_wrap_up_margin(),
            max_correction_reentries: default_max_correction_reentries(),
            max_consecutive_clarifications: default_max_consecutive_clarifications(),
            silence_timeout_secs: default_silence_timeout(),
        }
    }
}

fn default_max_questions() -> u32 {
    DEFAULT_MAX_QUESTIONS
}

fn default_wrap_up_margin() -> u32 {
    DEFAULT_WRAP_UP_MARGIN
}

fn default_max_correction_reentries() -> u32 {
    DEFAULT_MAX_CORRECTION_REENTRIES
}

fn default_max_consecutive_clarifications() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_CLARIFICATIONS
}

fn default_silence_timeout() -> u64 {
    30
}
