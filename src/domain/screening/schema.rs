//! Field schema: the static table of everything the report needs.

use super::field::{FieldCategory, FieldDefinition};
use super::phase::InterviewPhase;
use super::state::InterviewState;

/// Field identifiers of the standard schema.
pub mod field_ids {
    pub const PATIENT_NAME: &str = "patient_name";
    pub const APPOINTMENT_DATE: &str = "appointment_date";
    pub const EMERGENCY_CONTACT: &str = "emergency_contact";
    pub const CHIEF_COMPLAINT: &str = "chief_complaint";
    pub const ONSET: &str = "onset";
    pub const PROVOCATION: &str = "provocation";
    pub const QUALITY: &str = "quality";
    pub const RADIATION: &str = "radiation";
    pub const SEVERITY: &str = "severity";
    pub const TIMING: &str = "timing";
    pub const ADDITIONAL_SYMPTOMS: &str = "additional_symptoms";
    pub const MEDICAL_HISTORY: &str = "medical_history";
    pub const MEDICATIONS: &str = "medications";
    pub const ALLERGIES: &str = "allergies";
    pub const FAMILY_HISTORY: &str = "family_history";
    pub const SOCIAL_HISTORY: &str = "social_history";
    pub const ADDITIONAL_INFO: &str = "additional_info";
}

use field_ids::*;

const fn def(
    id: &'static str,
    label: &'static str,
    category: FieldCategory,
    phase: InterviewPhase,
    required: bool,
) -> FieldDefinition {
    FieldDefinition {
        id,
        label,
        category,
        phase,
        required,
    }
}

static STANDARD_FIELDS: [FieldDefinition; 17] = [
    def(PATIENT_NAME, "Patient Name", FieldCategory::Identification, InterviewPhase::Identification, true),
    def(APPOINTMENT_DATE, "Appointment Date", FieldCategory::Identification, InterviewPhase::Identification, true),
    def(EMERGENCY_CONTACT, "Emergency Contact", FieldCategory::Identification, InterviewPhase::Identification, false),
    def(CHIEF_COMPLAINT, "Primary Concern", FieldCategory::ChiefComplaint, InterviewPhase::Hpi, true),
    def(ONSET, "Onset", FieldCategory::HpiOnset, InterviewPhase::Hpi, true),
    def(PROVOCATION, "Provocation", FieldCategory::HpiProvocation, InterviewPhase::Hpi, true),
    def(QUALITY, "Quality", FieldCategory::HpiQuality, InterviewPhase::Hpi, true),
    def(RADIATION, "Radiation", FieldCategory::HpiRadiation, InterviewPhase::Hpi, true),
    def(SEVERITY, "Severity", FieldCategory::HpiSeverity, InterviewPhase::Hpi, true),
    def(TIMING, "Time", FieldCategory::HpiTime, InterviewPhase::Hpi, true),
    def(ADDITIONAL_SYMPTOMS, "Additional Symptoms", FieldCategory::ChiefComplaint, InterviewPhase::Hpi, false),
    def(MEDICAL_HISTORY, "Past Medical History", FieldCategory::History, InterviewPhase::HistoryMedications, true),
    def(MEDICATIONS, "Current Medications", FieldCategory::Medications, InterviewPhase::HistoryMedications, true),
    def(ALLERGIES, "Allergies", FieldCategory::Allergies, InterviewPhase::HistoryMedications, true),
    def(FAMILY_HISTORY, "Family History", FieldCategory::FamilySocial, InterviewPhase::FamilySocial, true),
    def(SOCIAL_HISTORY, "Social History", FieldCategory::FamilySocial, InterviewPhase::FamilySocial, true),
    def(ADDITIONAL_INFO, "Additional Information", FieldCategory::FamilySocial, InterviewPhase::FamilySocial, false),
];

static STANDARD: FieldSchema = FieldSchema {
    fields: &STANDARD_FIELDS,
};

/// Immutable table of field definitions, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    fields: &'static [FieldDefinition],
}

impl FieldSchema {
    /// The standard pre-visit screening schema.
    pub fn standard() -> &'static FieldSchema {
        &STANDARD
    }

    /// All definitions in schema order.
    pub fn definitions(&self) -> &'static [FieldDefinition] {
        self.fields
    }

    /// Looks up a definition by field id.
    pub fn definition(&self, field_id: &str) -> Option<&'static FieldDefinition> {
        self.fields.iter().find(|d| d.id == field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.definition(field_id).is_some()
    }

    /// Field ids owned by a phase, in schema order.
    pub fn fields_for_phase(&self, phase: InterviewPhase) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|d| d.phase == phase)
            .map(|d| d.id)
            .collect()
    }

    /// Required field ids owned by a phase, in schema order.
    pub fn required_for_phase(&self, phase: InterviewPhase) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|d| d.phase == phase && d.required)
            .map(|d| d.id)
            .collect()
    }

    /// True iff every required field of the phase holds a value.
    ///
    /// Declines and pertinent negatives are values, so they count.
    pub fn is_phase_complete(&self, state: &InterviewState, phase: InterviewPhase) -> bool {
        self.required_for_phase(phase)
            .into_iter()
            .all(|id| state.field(id).is_some_and(|f| f.is_filled()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::field::FieldValue;
    use crate::domain::screening::test_support::new_state;
    use std::collections::HashSet;

    #[test]
    fn field_ids_are_unique() {
        let ids: HashSet<_> = FieldSchema::standard().definitions().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), FieldSchema::standard().definitions().len());
    }

    #[test]
    fn schema_order_groups_fields_by_phase() {
        let phases: Vec<_> = FieldSchema::standard()
            .definitions()
            .iter()
            .map(|d| d.phase.index())
            .collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn only_collection_phases_own_fields() {
        let schema = FieldSchema::standard();
        assert!(schema.fields_for_phase(InterviewPhase::Confirmation).is_empty());
        assert!(schema.fields_for_phase(InterviewPhase::Completed).is_empty());
    }

    #[test]
    fn hpi_covers_chief_complaint_and_opqrst() {
        let required = FieldSchema::standard().required_for_phase(InterviewPhase::Hpi);
        assert_eq!(
            required,
            vec![CHIEF_COMPLAINT, ONSET, PROVOCATION, QUALITY, RADIATION, SEVERITY, TIMING]
        );
    }

    #[test]
    fn optional_fields_are_listed_but_not_required() {
        let schema = FieldSchema::standard();
        assert!(schema.fields_for_phase(InterviewPhase::Identification).contains(&EMERGENCY_CONTACT));
        assert!(!schema.required_for_phase(InterviewPhase::Identification).contains(&EMERGENCY_CONTACT));
    }

    #[test]
    fn every_clinical_line_label_names_its_category() {
        for definition in FieldSchema::standard().definitions() {
            assert!(
                definition.line_label().contains(definition.category.name())
                    || definition.category == FieldCategory::Identification,
                "{} does not name {}",
                definition.id,
                definition.category
            );
        }
    }

    #[test]
    fn unknown_ids_are_not_in_schema() {
        assert!(!FieldSchema::standard().contains("blood_type"));
        assert!(FieldSchema::standard().contains(ONSET));
    }

    mod phase_completion {
        use super::*;

        #[test]
        fn empty_phase_is_incomplete() {
            let state = new_state();
            assert!(!FieldSchema::standard().is_phase_complete(&state, InterviewPhase::Identification));
        }

        #[test]
        fn required_fields_complete_the_phase_without_optional_ones() {
            let mut state = new_state();
            state.record_answer(PATIENT_NAME, FieldValue::stated("Ana Ruiz")).unwrap();
            state.record_answer(APPOINTMENT_DATE, FieldValue::stated("March 3")).unwrap();
            assert!(FieldSchema::standard().is_phase_complete(&state, InterviewPhase::Identification));
        }

        #[test]
        fn declined_counts_as_filled() {
            let mut state = new_state();
            state.record_answer(MEDICAL_HISTORY, FieldValue::Declined).unwrap();
            state.record_answer(MEDICATIONS, FieldValue::NoneReported).unwrap();
            state.record_answer(ALLERGIES, FieldValue::stated("penicillin")).unwrap();
            assert!(FieldSchema::standard().is_phase_complete(&state, InterviewPhase::HistoryMedications));
        }

        #[test]
        fn phases_without_fields_are_trivially_complete() {
            let state = new_state();
            assert!(FieldSchema::standard().is_phase_complete(&state, InterviewPhase::Confirmation));
        }
    }
}
