//! Call scripts: a recorded or simulated call as JSON.
//!
//! ```json
//! {
//!   "metadata": {"phone_number": "+15550100", "patient_name": "Ana Ruiz"},
//!   "events": [
//!     {"say": "Yes, this is Ana.", "fields": {"patient_name": "Ana Ruiz"}},
//!     {"say": "Can I talk to someone?", "signal": "requested_human"},
//!     {"end": "hangup"}
//!   ]
//! }
//! ```
//!
//! `metadata` may also be the raw dispatch string. `fields` and `signal`
//! are the pre-extracted reading of each utterance, replayed when no
//! model is configured.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::ScriptedCallChannel;
use crate::domain::foundation::ValidationError;
use crate::domain::screening::{CallEndReason, CallMetadata, FieldValue, PatientSignal, TurnInput};
use crate::ports::CallEvent;

/// Errors reading a call script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid call script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid call metadata: {0}")]
    Metadata(#[from] ValidationError),
}

#[derive(Debug, Deserialize)]
struct RawScript {
    metadata: serde_json::Value,
    #[serde(default)]
    events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ScriptEvent {
    Utterance {
        say: String,
        #[serde(default)]
        fields: BTreeMap<String, String>,
        #[serde(default)]
        signal: Option<PatientSignal>,
    },
    End {
        end: CallEndReason,
    },
}

/// A parsed call script.
#[derive(Debug, Clone)]
pub struct CallScript {
    metadata: CallMetadata,
    events: Vec<CallEvent>,
    inputs: Vec<TurnInput>,
}

impl CallScript {
    pub fn parse(json: &str) -> Result<Self, ScriptError> {
        let raw: RawScript = serde_json::from_str(json)?;

        let metadata = match &raw.metadata {
            serde_json::Value::String(dispatch) => CallMetadata::from_dispatch(dispatch)?,
            other => CallMetadata::from_dispatch(&other.to_string())?,
        };

        let mut events = Vec::with_capacity(raw.events.len());
        let mut inputs = Vec::new();
        for event in raw.events {
            match event {
                ScriptEvent::Utterance { say, fields, signal } => {
                    events.push(CallEvent::Utterance(say));
                    inputs.push(Self::turn_input(fields, signal));
                }
                ScriptEvent::End { end } => events.push(CallEvent::Ended(end)),
            }
        }

        Ok(Self {
            metadata,
            events,
            inputs,
        })
    }

    fn turn_input(fields: BTreeMap<String, String>, signal: Option<PatientSignal>) -> TurnInput {
        let mut input = TurnInput::empty();
        for (field, raw) in fields {
            if let Some(value) = FieldValue::from_extracted(&raw) {
                input = input.with_extraction(field, value);
            }
        }
        input.signal = signal;
        input
    }

    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    /// Pre-extracted input for each utterance, in order.
    pub fn turn_inputs(&self) -> &[TurnInput] {
        &self.inputs
    }

    pub fn utterance_count(&self) -> usize {
        self.inputs.len()
    }

    /// A channel that plays this script.
    pub fn channel(&self) -> ScriptedCallChannel {
        ScriptedCallChannel::new(self.events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::Extraction;

    #[test]
    fn parses_object_metadata_and_events() {
        let script = CallScript::parse(
            r#"{
                "metadata": {"phone_number": "+15550100", "patient_name": "Ana Ruiz"},
                "events": [
                    {"say": "Yes, Ana Ruiz.", "fields": {"patient_name": "Ana Ruiz", "allergies": "none"}},
                    {"say": "Get me a person", "signal": "requested_human"},
                    {"end": "hangup"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.metadata().phone_number(), "+15550100");
        assert_eq!(script.utterance_count(), 2);
        assert_eq!(
            script.turn_inputs()[0].extractions,
            vec![
                Extraction::new("allergies", FieldValue::NoneReported),
                Extraction::stated("patient_name", "Ana Ruiz"),
            ]
        );
        assert_eq!(script.turn_inputs()[1].signal, Some(PatientSignal::RequestedHuman));
    }

    #[test]
    fn accepts_loose_dispatch_string() {
        let script = CallScript::parse(
            r#"{"metadata": "{phone_number: +15550100, patient_name: Ana Ruiz}", "events": []}"#,
        )
        .unwrap();

        assert_eq!(script.metadata().patient_name(), Some("Ana Ruiz"));
        assert_eq!(script.utterance_count(), 0);
    }

    #[test]
    fn missing_phone_is_rejected() {
        let err = CallScript::parse(r#"{"metadata": {"patient_name": "Ana"}}"#).unwrap_err();
        assert!(matches!(err, ScriptError::Metadata(_)));
    }

    #[tokio::test]
    async fn channel_plays_events_in_order() {
        use crate::ports::CallChannel;

        let script = CallScript::parse(
            r#"{"metadata": {"phone_number": "1"}, "events": [{"say": "hi"}, {"end": "voicemail"}]}"#,
        )
        .unwrap();
        let channel = script.channel();

        assert_eq!(channel.next_event().await.unwrap(), CallEvent::Utterance("hi".into()));
        assert_eq!(
            channel.next_event().await.unwrap(),
            CallEvent::Ended(CallEndReason::Voicemail)
        );
    }
}
