//! Call metadata supplied once by the dispatcher at session start.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Dispatcher-assigned urgency of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl CallPriority {
    fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }
}

impl fmt::Display for CallPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// Immutable facts about the call, known before the patient answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallMetadata {
    phone_number: String,
    patient_name: Option<String>,
    appointment_date: Option<String>,
    priority: CallPriority,
    notes: Option<String>,
    call_id: Option<String>,
}

/// Wire shape of the dispatcher's JSON metadata.
#[derive(Debug, Deserialize)]
struct DispatchMetadata {
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    patient_name: Option<String>,
    #[serde(default)]
    appointment_date: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, alias = "notes")]
    doctor_note: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CallMetadata {
    /// Creates metadata for a phone number; other facts are optional.
    pub fn new(phone_number: impl Into<String>) -> Result<Self, ValidationError> {
        let phone_number = phone_number.into().trim().to_string();
        if phone_number.is_empty() {
            return Err(ValidationError::empty_field("phone_number"));
        }
        Ok(Self {
            phone_number,
            patient_name: None,
            appointment_date: None,
            priority: CallPriority::default(),
            notes: None,
            call_id: None,
        })
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = non_blank(Some(name.into()));
        self
    }

    pub fn with_appointment_date(mut self, date: impl Into<String>) -> Self {
        self.appointment_date = non_blank(Some(date.into()));
        self
    }

    pub fn with_priority(mut self, priority: CallPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(Some(notes.into()));
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = non_blank(Some(call_id.into()));
        self
    }

    /// Parses dispatcher metadata.
    ///
    /// Accepts a JSON object. Input that is not valid JSON falls back to a
    /// loose `{key: value, ...}` reading, which is what older dispatch scripts
    /// produce. A phone number is always required.
    pub fn from_dispatch(raw: &str) -> Result<Self, ValidationError> {
        let dispatch = match serde_json::from_str::<DispatchMetadata>(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!("dispatch metadata is not JSON ({}), using loose parsing", err);
                Self::parse_loose(raw)
            }
        };

        let phone_number = non_blank(dispatch.phone_number)
            .ok_or_else(|| ValidationError::empty_field("phone_number"))?;

        let mut metadata = Self::new(phone_number)?;
        metadata.patient_name = non_blank(dispatch.patient_name);
        metadata.appointment_date = non_blank(dispatch.appointment_date);
        metadata.priority = dispatch
            .priority
            .as_deref()
            .map(CallPriority::parse_lenient)
            .unwrap_or_default();
        metadata.notes = non_blank(dispatch.doctor_note);
        metadata.call_id = non_blank(dispatch.call_id);
        Ok(metadata)
    }

    fn parse_loose(raw: &str) -> DispatchMetadata {
        let mut dispatch = DispatchMetadata {
            phone_number: None,
            patient_name: None,
            appointment_date: None,
            priority: None,
            doctor_note: None,
            call_id: None,
        };

        let body = raw.trim().trim_start_matches('{').trim_end_matches('}');
        for item in body.split(',') {
            let Some((key, value)) = item.split_once(':') else {
                continue;
            };
            let key = key.trim().trim_matches('"');
            let value = Some(value.trim().trim_matches('"').to_string());
            match key {
                "phone_number" => dispatch.phone_number = value,
                "patient_name" => dispatch.patient_name = value,
                "appointment_date" => dispatch.appointment_date = value,
                "priority" => dispatch.priority = value,
                "doctor_note" | "notes" => dispatch.doctor_note = value,
                "call_id" => dispatch.call_id = value,
                _ => {}
            }
        }
        dispatch
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient_name.as_deref()
    }

    pub fn appointment_date(&self) -> Option<&str> {
        self.appointment_date.as_deref()
    }

    pub fn priority(&self) -> CallPriority {
        self.priority
    }

    /// Referral notes from the scheduling clinician.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_phone_number() {
        assert!(CallMetadata::new("  ").is_err());
        assert_eq!(CallMetadata::new(" +15550100 ").unwrap().phone_number(), "+15550100");
    }

    #[test]
    fn builders_drop_blank_values() {
        let metadata = CallMetadata::new("+15550100")
            .unwrap()
            .with_patient_name("  ")
            .with_notes("follow up on chest pain");
        assert_eq!(metadata.patient_name(), None);
        assert_eq!(metadata.notes(), Some("follow up on chest pain"));
    }

    mod from_dispatch {
        use super::*;

        #[test]
        fn parses_json_metadata() {
            let raw = r#"{"phone_number":"+15550100","patient_name":"Ana Ruiz","priority":"urgent","doctor_note":"check BP","call_id":"c-1"}"#;
            let metadata = CallMetadata::from_dispatch(raw).unwrap();
            assert_eq!(metadata.phone_number(), "+15550100");
            assert_eq!(metadata.patient_name(), Some("Ana Ruiz"));
            assert_eq!(metadata.priority(), CallPriority::Urgent);
            assert_eq!(metadata.notes(), Some("check BP"));
            assert_eq!(metadata.call_id(), Some("c-1"));
        }

        #[test]
        fn unknown_priority_defaults_to_normal() {
            let raw = r#"{"phone_number":"+15550100","priority":"whenever"}"#;
            assert_eq!(CallMetadata::from_dispatch(raw).unwrap().priority(), CallPriority::Normal);
        }

        #[test]
        fn falls_back_to_loose_parsing() {
            let raw = "{phone_number: +15550100, patient_name: Ana Ruiz}";
            let metadata = CallMetadata::from_dispatch(raw).unwrap();
            assert_eq!(metadata.phone_number(), "+15550100");
            assert_eq!(metadata.patient_name(), Some("Ana Ruiz"));
        }

        #[test]
        fn missing_phone_number_is_rejected() {
            let err = CallMetadata::from_dispatch(r#"{"patient_name":"Ana"}"#).unwrap_err();
            assert_eq!(err, ValidationError::empty_field("phone_number"));
        }

        #[test]
        fn garbage_is_rejected() {
            assert!(CallMetadata::from_dispatch("hello").is_err());
        }
    }
}
