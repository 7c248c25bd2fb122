//! Reasoning Engine Port - Language understanding for the interview.
//!
//! The engine decides *what* to ask; a reasoning collaborator turns that
//! into speech and turns the patient's answer back into structured fields.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::screening::{Directive, TurnInput};
use crate::ports::AIError;

/// Port for field extraction and utterance generation.
///
/// # Contract
///
/// - `extract_fields` returns only what the latest patient utterance says;
///   field ids outside the schema are tolerated (the engine drops them)
/// - `generate_utterance` for a `Confirmation` must contain the summary
///   verbatim; for an `End` it yields the closing line (empty when nobody
///   is left to hear it)
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Extracts fields and signals from the latest patient utterance.
    async fn extract_fields(
        &self,
        transcript: &Transcript,
        pending: &Directive,
    ) -> Result<TurnInput, ReasoningError>;

    /// Renders a directive into what the agent says next.
    async fn generate_utterance(
        &self,
        directive: &Directive,
        transcript: &Transcript,
    ) -> Result<String, ReasoningError>;
}

/// Who spoke a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    Patient,
}

/// One line of the call transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered record of what was said on the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::Agent,
            text: text.into(),
        });
    }

    pub fn push_patient(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::Patient,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// The most recent patient line.
    pub fn last_patient_utterance(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.speaker == Speaker::Patient)
            .map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reasoning collaborator errors.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// The underlying model call failed.
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// The model answered, but not in the expected shape.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// A scripted engine ran out of prepared turns.
    #[error("script exhausted")]
    ScriptExhausted,
}

impl ReasoningError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOutput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_tracks_last_patient_line() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.last_patient_utterance(), None);

        transcript.push_agent("What brings you in?");
        transcript.push_patient("My knee hurts.");
        transcript.push_agent("When did it start?");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last_patient_utterance(), Some("My knee hurts."));
    }

    #[test]
    fn provider_errors_convert() {
        let err: ReasoningError = AIError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "provider error: provider rejected the API key");
    }
}
