//! Turn input and directive output of the interview engine.

use serde::{Deserialize, Serialize};

use super::field::FieldValue;
use super::phase::InterviewPhase;
use super::report::Report;
use super::state::CallEndReason;

/// Explicit intent detected in the patient's utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientSignal {
    /// Yes, that's right.
    Confirmed,
    /// Declines to answer, or asks to correct the summary.
    Declined,
    /// Asks to speak with a person.
    RequestedHuman,
}

/// One field extracted from the latest utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub field: String,
    pub value: FieldValue,
}

impl Extraction {
    pub fn new(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn stated(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(field, FieldValue::stated(text))
    }
}

/// Everything the reasoning collaborator extracted from one patient turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnInput {
    #[serde(default)]
    pub extractions: Vec<Extraction>,
    #[serde(default)]
    pub signal: Option<PatientSignal>,
}

impl TurnInput {
    /// A turn with nothing usable in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_extraction(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.extractions.push(Extraction::new(field, value));
        self
    }

    pub fn with_stated(self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_extraction(field, FieldValue::stated(text))
    }

    pub fn with_signal(mut self, signal: PatientSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn confirmed() -> Self {
        Self::default().with_signal(PatientSignal::Confirmed)
    }

    pub fn declined() -> Self {
        Self::default().with_signal(PatientSignal::Declined)
    }

    pub fn is_empty(&self) -> bool {
        self.extractions.is_empty() && self.signal.is_none()
    }
}

/// Whether a prompt asks something new or repeats the last question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptIntent {
    Ask,
    Clarify,
}

/// Ask the patient about the target fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptDirective {
    pub phase: InterviewPhase,
    pub intent: PromptIntent,
    pub guidance: &'static str,
    /// Unfilled fields of the phase, required ones first.
    pub target_fields: Vec<&'static str>,
    /// Budget position of the question; clarifications repeat the number.
    pub question_number: u32,
}

/// Read the draft summary back to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationDirective {
    pub summary: String,
    pub reentry: u32,
    /// The patient asked for a correction but has not given it yet.
    pub awaiting_correction: bool,
}

/// The interview is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndDirective {
    pub report: Report,
    pub reason: CallEndReason,
}

/// The engine's answer to a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Prompt(PromptDirective),
    Confirmation(ConfirmationDirective),
    End(EndDirective),
}

impl Directive {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End(_))
    }

    pub fn as_prompt(&self) -> Option<&PromptDirective> {
        match self {
            Self::Prompt(prompt) => Some(prompt),
            _ => None,
        }
    }

    pub fn as_confirmation(&self) -> Option<&ConfirmationDirective> {
        match self {
            Self::Confirmation(confirmation) => Some(confirmation),
            _ => None,
        }
    }

    pub fn as_end(&self) -> Option<&EndDirective> {
        match self {
            Self::End(end) => Some(end),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Prompt(p) if p.intent == PromptIntent::Clarify => "clarify",
            Self::Prompt(_) => "prompt",
            Self::Confirmation(_) => "confirmation",
            Self::End(_) => "end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_input_deserializes_from_script_shape() {
        let json = r#"{
            "extractions": [
                {"field": "onset", "value": {"kind": "stated", "text": "yesterday"}},
                {"field": "radiation", "value": {"kind": "none_reported"}}
            ],
            "signal": "declined"
        }"#;
        let input: TurnInput = serde_json::from_str(json).unwrap();
        assert_eq!(
            input,
            TurnInput::default()
                .with_stated("onset", "yesterday")
                .with_extraction("radiation", FieldValue::NoneReported)
                .with_signal(PatientSignal::Declined)
        );
    }

    #[test]
    fn missing_keys_default_to_an_empty_turn() {
        let input: TurnInput = serde_json::from_str("{}").unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn signal_alone_is_not_empty() {
        assert!(!TurnInput::confirmed().is_empty());
    }
}
