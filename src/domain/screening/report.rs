//! Report synthesis.
//!
//! Turns a terminated interview snapshot into the canonical plain-text
//! report. Rendering is pure: the same snapshot always yields the same bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::InterviewError;
use super::field::{Field, FieldCategory};
use super::schema::field_ids;
use super::state::{CallEndReason, ConfirmationStatus, InterviewSnapshot, InterviewState};
use crate::domain::foundation::{Percentage, SessionId, Timestamp};

const TITLE: &str = "PRE-VISIT SCREENING REPORT";
const NOT_PROVIDED: &str = "Not provided";
const NOTHING_RECORDED: &str = "No information recorded.";

/// Final status shown in Report Details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Complete,
    UnconfirmedCorrectionLimit,
    UnconfirmedNoConfirmation,
    IncompleteEndedEarly,
    IncompleteTransferred,
    IncompleteAborted,
}

impl ReportStatus {
    /// Derives the status from how the interview ended.
    pub fn for_state(state: &InterviewState) -> Self {
        match state.end_reason() {
            Some(CallEndReason::Completed) => match state.confirmation() {
                ConfirmationStatus::Confirmed => Self::Complete,
                ConfirmationStatus::CorrectionLimitReached => Self::UnconfirmedCorrectionLimit,
                _ => Self::UnconfirmedNoConfirmation,
            },
            Some(reason) if reason.is_early_disconnect() => Self::IncompleteEndedEarly,
            Some(CallEndReason::TransferRequested) => Self::IncompleteTransferred,
            _ => Self::IncompleteAborted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::UnconfirmedCorrectionLimit => "Unconfirmed — correction limit reached",
            Self::UnconfirmedNoConfirmation => "Unconfirmed — no confirmation received",
            Self::IncompleteEndedEarly => "Incomplete — call ended early",
            Self::IncompleteTransferred => "Incomplete — transferred to staff",
            Self::IncompleteAborted => "Incomplete — interview aborted",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many required fields were actually assessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    pub assessed: usize,
    pub required: usize,
    /// Labels of required fields left unassessed, in schema order.
    pub not_assessed: Vec<&'static str>,
}

impl Completeness {
    pub fn from_fields(fields: &[Field]) -> Self {
        let required: Vec<&Field> = fields.iter().filter(|f| f.definition().required).collect();
        let not_assessed: Vec<&'static str> = required
            .iter()
            .filter(|f| !f.is_assessed())
            .map(|f| f.definition().label)
            .collect();
        Self {
            assessed: required.len() - not_assessed.len(),
            required: required.len(),
            not_assessed,
        }
    }

    pub fn percentage(&self) -> Percentage {
        Percentage::from_ratio(self.assessed, self.required)
    }
}

/// Key lines of a stored report, used when listing reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReportHeadline {
    pub patient_name: Option<String>,
    pub primary_concern: Option<String>,
    pub status: Option<String>,
}

impl ReportHeadline {
    /// Reads the headline from rendered report text.
    ///
    /// Older reports label the complaint `Chief Complaint:`; both forms are
    /// accepted.
    pub fn parse(text: &str) -> Self {
        let mut headline = Self::default();
        for line in text.lines() {
            if headline.patient_name.is_none() {
                headline.patient_name = value_after(line, "Patient Name:");
            }
            if headline.primary_concern.is_none() {
                headline.primary_concern = value_after(line, "Primary Concern:")
                    .or_else(|| value_after(line, "Chief Complaint:"));
            }
            if headline.status.is_none() && line.starts_with("Status:") {
                headline.status = value_after(line, "Status:");
            }
        }
        headline
    }
}

fn value_after(line: &str, key: &str) -> Option<String> {
    line.find(key)
        .map(|idx| line[idx + key.len()..].trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The finished report. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    session_id: SessionId,
    phone_number: String,
    generated_at: Timestamp,
    status: ReportStatus,
    completeness: Completeness,
    questions_asked: u32,
    text: String,
}

impl Report {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// End of the interview; stable for a given snapshot.
    pub fn generated_at(&self) -> Timestamp {
        self.generated_at
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn completeness(&self) -> &Completeness {
        &self.completeness
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    /// The rendered report, written to storage verbatim.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn headline(&self) -> ReportHeadline {
        ReportHeadline::parse(&self.text)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    PrimaryConcern,
    PresentIllness,
    MedicalHistory,
    MedicationsAllergies,
}

impl Section {
    const CLINICAL: [Section; 4] = [
        Section::PrimaryConcern,
        Section::PresentIllness,
        Section::MedicalHistory,
        Section::MedicationsAllergies,
    ];

    fn heading(&self) -> &'static str {
        match self {
            Self::PrimaryConcern => "PRIMARY CONCERN",
            Self::PresentIllness => "HISTORY OF PRESENT ILLNESS (HPI)",
            Self::MedicalHistory => "RELEVANT MEDICAL HISTORY",
            Self::MedicationsAllergies => "CURRENT MEDICATIONS AND ALLERGIES",
        }
    }

    fn for_category(category: FieldCategory) -> Option<Self> {
        match category {
            FieldCategory::Identification => None,
            FieldCategory::ChiefComplaint => Some(Self::PrimaryConcern),
            FieldCategory::History | FieldCategory::FamilySocial => Some(Self::MedicalHistory),
            FieldCategory::Medications | FieldCategory::Allergies => Some(Self::MedicationsAllergies),
            c if c.is_opqrst() => Some(Self::PresentIllness),
            _ => None,
        }
    }
}

/// Renders reports and confirmation summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSynthesizer;

impl ReportSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Builds the final report from a terminated snapshot.
    pub fn synthesize(&self, snapshot: &InterviewSnapshot) -> Result<Report, InterviewError> {
        if !snapshot.is_terminated() {
            return Err(InterviewError::NotTerminated);
        }
        Ok(self.render(snapshot))
    }

    /// Renders without the termination check; callers guarantee it.
    pub(crate) fn render(&self, snapshot: &InterviewSnapshot) -> Report {
        let status = ReportStatus::for_state(snapshot);
        let completeness = Completeness::from_fields(snapshot.fields());
        let generated_at = snapshot.ended_at().unwrap_or_else(|| snapshot.started_at());

        let mut text = String::new();
        heading(&mut text, TITLE, '=');
        self.render_patient_information(&mut text, snapshot);
        for section in Section::CLINICAL {
            self.render_clinical_section(&mut text, snapshot, section);
        }
        self.render_interview_summary(&mut text, snapshot, status);
        self.render_details(&mut text, snapshot, status, &completeness, generated_at);

        Report {
            session_id: snapshot.session_id(),
            phone_number: snapshot.metadata().phone_number().to_string(),
            generated_at,
            status,
            completeness,
            questions_asked: snapshot.questions_asked(),
            text,
        }
    }

    /// Draft read-back of everything the patient told us.
    ///
    /// Unfilled and unassessed fields are left out.
    pub fn confirmation_summary(&self, state: &InterviewState) -> String {
        let mut summary = String::new();
        for field in state.fields().iter().filter(|f| f.is_assessed()) {
            if let Some(value) = field.value() {
                summary.push_str(&format!("{}: {}\n", field.definition().line_label(), value));
            }
        }
        summary
    }

    fn render_patient_information(&self, out: &mut String, state: &InterviewState) {
        let metadata = state.metadata();
        let recorded = |id: &str| {
            state
                .field(id)
                .filter(|f| f.is_assessed())
                .and_then(|f| f.value())
                .map(|v| v.to_string())
        };

        section(out, "PATIENT INFORMATION");
        let name = recorded(field_ids::PATIENT_NAME)
            .or_else(|| metadata.patient_name().map(str::to_string))
            .unwrap_or_else(|| NOT_PROVIDED.to_string());
        let appointment = recorded(field_ids::APPOINTMENT_DATE)
            .or_else(|| metadata.appointment_date().map(str::to_string))
            .unwrap_or_else(|| NOT_PROVIDED.to_string());

        out.push_str(&format!("Patient Name: {}\n", name));
        out.push_str(&format!("Phone Number: {}\n", metadata.phone_number()));
        out.push_str(&format!("Appointment Date: {}\n", appointment));
        if let Some(contact) = recorded(field_ids::EMERGENCY_CONTACT) {
            out.push_str(&format!("Emergency Contact: {}\n", contact));
        }
        out.push_str(&format!("Call Priority: {}\n", metadata.priority()));
        if let Some(call_id) = metadata.call_id() {
            out.push_str(&format!("Call ID: {}\n", call_id));
        }
    }

    fn render_clinical_section(&self, out: &mut String, state: &InterviewState, target: Section) {
        section(out, target.heading());
        let mut wrote = false;
        for field in state.fields() {
            if Section::for_category(field.definition().category) != Some(target) {
                continue;
            }
            if let Some(value) = field.value() {
                out.push_str(&format!("{}: {}\n", field.definition().line_label(), value));
                wrote = true;
            }
        }
        if !wrote {
            out.push_str(NOTHING_RECORDED);
            out.push('\n');
        }
    }

    fn render_interview_summary(&self, out: &mut String, state: &InterviewState, status: ReportStatus) {
        section(out, "INTERVIEW SUMMARY");
        let confirmation = match state.confirmation() {
            ConfirmationStatus::Confirmed => "confirmed by patient",
            ConfirmationStatus::CorrectionLimitReached => "not confirmed, correction limit reached",
            ConfirmationStatus::NotObtained | ConfirmationStatus::Awaiting { .. } => "not confirmed",
            ConfirmationStatus::NotStarted => "not reached",
        };
        out.push_str(&format!("Summary Confirmation: {}\n", confirmation));
        out.push_str(&format!("Corrections Requested: {}\n", state.corrections_requested()));
        out.push_str(&format!("Clarifications: {}\n", state.clarifications_total()));
        if let Some(notes) = state.metadata().notes() {
            out.push_str(&format!("Referral Notes: {}\n", notes));
        }
        if !status.is_complete() {
            out.push_str("Review: unassessed items should be covered at the visit.\n");
        }
    }

    fn render_details(
        &self,
        out: &mut String,
        state: &InterviewState,
        status: ReportStatus,
        completeness: &Completeness,
        generated_at: Timestamp,
    ) {
        section(out, "REPORT DETAILS");
        out.push_str(&format!("Questions Asked: {}\n", state.questions_asked()));
        out.push_str(&format!("Final Phase: {}\n", state.phase()));
        out.push_str(&format!(
            "Required Fields Assessed: {}/{} ({})\n",
            completeness.assessed,
            completeness.required,
            completeness.percentage()
        ));
        let not_assessed = if completeness.not_assessed.is_empty() {
            "none".to_string()
        } else {
            completeness.not_assessed.join(", ")
        };
        out.push_str(&format!("Not Assessed: {}\n", not_assessed));
        out.push_str(&format!("Status: {}\n", status));
        let reason = state
            .end_reason()
            .map(|r| r.as_str())
            .unwrap_or("unknown");
        out.push_str(&format!("End Reason: {}\n", reason));
        out.push_str(&format!("Session ID: {}\n", state.session_id()));
        out.push_str(&format!("Call Started: {}\n", state.started_at()));
        out.push_str(&format!("Report Generated: {}\n", generated_at));
    }
}

fn heading(out: &mut String, title: &str, underline: char) {
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat(underline).take(title.chars().count()));
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    heading(out, title, '-');
}
