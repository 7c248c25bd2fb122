//! Field types: categories, values and the per-session field record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::InterviewPhase;

/// Clinical category a field belongs to.
///
/// The HPI categories follow the OPQRST mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Identification,
    ChiefComplaint,
    HpiOnset,
    HpiProvocation,
    HpiQuality,
    HpiRadiation,
    HpiSeverity,
    HpiTime,
    History,
    Medications,
    Allergies,
    FamilySocial,
}

impl FieldCategory {
    /// Category name as rendered in the report.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identification => "Identification",
            Self::ChiefComplaint => "Chief Complaint",
            Self::HpiOnset => "Onset",
            Self::HpiProvocation => "Provocation",
            Self::HpiQuality => "Quality",
            Self::HpiRadiation => "Radiation",
            Self::HpiSeverity => "Severity",
            Self::HpiTime => "Time",
            Self::History => "Medical History",
            Self::Medications => "Medications",
            Self::Allergies => "Allergies",
            Self::FamilySocial => "Family/Social",
        }
    }

    /// Returns true for the six OPQRST categories.
    pub fn is_opqrst(&self) -> bool {
        matches!(
            self,
            Self::HpiOnset
                | Self::HpiProvocation
                | Self::HpiQuality
                | Self::HpiRadiation
                | Self::HpiSeverity
                | Self::HpiTime
        )
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendered text for a pertinent negative.
pub const NONE_REPORTED: &str = "none reported";

/// Rendered text for a field the patient chose not to answer.
pub const PATIENT_DECLINED: &str = "patient declined to answer";

/// Rendered text for a field skipped by a forced wrap-up.
pub const NOT_ASSESSED: &str = "not assessed";

/// Value recorded for a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text as stated by the patient.
    Stated(String),

    /// The patient explicitly denies the symptom or condition.
    NoneReported,

    /// The patient declined to answer.
    Declined,

    /// The interview moved on before this field was covered.
    NotAssessed,
}

impl FieldValue {
    /// Creates a stated value.
    pub fn stated(text: impl Into<String>) -> Self {
        Self::Stated(text.into())
    }

    /// Interprets a raw extracted string.
    ///
    /// Blank input yields `None`. Explicit denials map to `NoneReported` so
    /// they survive as pertinent negatives.
    pub fn from_extracted(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        let value = match lower.as_str() {
            "none" | "none reported" | "denies" | "denied" | "no" | "n/a" => Self::NoneReported,
            "declined" | "patient declined" | "prefers not to say" => Self::Declined,
            _ => Self::Stated(text.to_string()),
        };
        Some(value)
    }

    /// Returns true unless the field was skipped by the engine.
    pub fn is_assessed(&self) -> bool {
        !matches!(self, Self::NotAssessed)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stated(text) => f.write_str(text),
            Self::NoneReported => f.write_str(NONE_REPORTED),
            Self::Declined => f.write_str(PATIENT_DECLINED),
            Self::NotAssessed => f.write_str(NOT_ASSESSED),
        }
    }
}

/// Static definition of one field in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: FieldCategory,
    pub phase: InterviewPhase,
    /// Must be filled before the owning phase counts as complete.
    pub required: bool,
}

impl FieldDefinition {
    /// Line label for rendered output.
    ///
    /// Clinical lines always carry the category name; when the label does not
    /// already contain it, the category is prefixed.
    pub fn line_label(&self) -> String {
        if self.category == FieldCategory::Identification
            || self.label.contains(self.category.name())
        {
            self.label.to_string()
        } else {
            format!("{} - {}", self.category.name(), self.label)
        }
    }
}

/// A field within one interview session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    definition: FieldDefinition,
    value: Option<FieldValue>,
    source_turn: Option<u32>,
}

impl Field {
    /// Creates an empty field from its definition.
    pub fn new(definition: FieldDefinition) -> Self {
        Self {
            definition,
            value: None,
            source_turn: None,
        }
    }

    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// Turn on which the current value was recorded.
    pub fn source_turn(&self) -> Option<u32> {
        self.source_turn
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Filled with something other than `NotAssessed`.
    pub fn is_assessed(&self) -> bool {
        self.value.as_ref().is_some_and(FieldValue::is_assessed)
    }

    pub(crate) fn set(&mut self, value: FieldValue, turn: u32) {
        self.value = Some(value);
        self.source_turn = Some(turn);
    }
}
