//! End-to-end screening calls through the public API.
//!
//! Calls are replayed from JSON scripts with scripted reasoning, stored on
//! disk, and read back through the list query.

use std::sync::Arc;

use previsit_screening::adapters::channel::CallScript;
use previsit_screening::adapters::reasoning::ScriptedReasoningEngine;
use previsit_screening::adapters::storage::LocalReportStorage;
use previsit_screening::application::{
    ListReportsHandler, ListReportsQuery, RunScreeningCallCommand, RunScreeningCallHandler,
    RunScreeningCallResult,
};
use previsit_screening::domain::foundation::SessionId;
use previsit_screening::domain::screening::{CallEndReason, InterviewPolicy, ReportStatus};
use previsit_screening::ports::ReportStorage;
use tempfile::TempDir;
use tokio::sync::watch;

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

const COOPERATIVE_CALL: &str = r#"{
    "metadata": {"phone_number": "+1 555 0100", "patient_name": "Ana Ruiz", "priority": "high"},
    "events": [
        {"say": "Yes, this is Ana, for March third.",
         "fields": {"patient_name": "Ana Ruiz", "appointment_date": "March 3"}},
        {"say": "My knee has been hurting.", "fields": {"chief_complaint": "Knee pain"}},
        {"say": "Three days ago, worse on stairs.",
         "fields": {"onset": "Three days ago", "provocation": "Worse on stairs"}},
        {"say": "Sharp, it stays in the knee.",
         "fields": {"quality": "Sharp", "radiation": "none"}},
        {"say": "About a six, comes and goes.",
         "fields": {"severity": "6 out of 10", "timing": "Comes and goes"}},
        {"say": "Asthma, I use an inhaler.",
         "fields": {"medical_history": "Asthma", "medications": "Inhaler"}},
        {"say": "No allergies.", "fields": {"allergies": "none"}},
        {"say": "Dad had arthritis. I don't smoke.",
         "fields": {"family_history": "Father had arthritis", "social_history": "Non-smoker"}},
        {"say": "Actually the pain is more like an eight.", "fields": {"severity": "8 out of 10"}},
        {"say": "Yes, that's right.", "signal": "confirmed"}
    ]
}"#;

async fn run_script(json: &str, storage: Arc<dyn ReportStorage>) -> RunScreeningCallResult {
    let script = CallScript::parse(json).unwrap();
    let handler = RunScreeningCallHandler::new(
        Arc::new(ScriptedReasoningEngine::new(script.turn_inputs().to_vec())),
        Arc::new(script.channel()),
        storage,
        Arc::new(InterviewPolicy::default()),
    );
    let (_tx, cancel) = watch::channel(None);

    handler
        .handle(
            RunScreeningCallCommand {
                session_id: SessionId::new(),
                metadata: script.metadata().clone(),
            },
            cancel,
        )
        .await
        .unwrap()
}

fn local_storage() -> (Arc<LocalReportStorage>, TempDir) {
    let temp = TempDir::new().unwrap();
    (Arc::new(LocalReportStorage::new(temp.path())), temp)
}

// ════════════════════════════════════════════════════════════════════════════
// Completed calls
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn corrected_call_is_stored_complete() {
    let (storage, temp) = local_storage();

    let result = run_script(COOPERATIVE_CALL, storage.clone()).await;

    assert_eq!(result.end_reason, CallEndReason::Completed);
    assert_eq!(result.status, ReportStatus::Complete);
    assert!(result.questions_asked <= 20);

    let text = result.report.text();
    assert!(text.contains("Severity: 8 out of 10"));
    assert!(!text.contains("6 out of 10"));
    assert!(text.contains("Allergies: none reported"));
    assert!(text.contains("Status: Complete"));

    let on_disk = tokio::fs::read_to_string(temp.path().join(&result.stored.file_name))
        .await
        .unwrap();
    assert_eq!(on_disk, text);
    assert!(result.stored.file_name.starts_with("medical_report_+15550100_"));
}

#[tokio::test]
async fn stored_report_is_listed_with_headline() {
    let (storage, _temp) = local_storage();
    run_script(COOPERATIVE_CALL, storage.clone()).await;

    let reports = ListReportsHandler::new(storage)
        .handle(ListReportsQuery {
            phone_number: Some("+1 (555) 0100".to_string()),
            limit: None,
        })
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let headline = &reports[0].headline;
    assert_eq!(headline.patient_name.as_deref(), Some("Ana Ruiz"));
    assert_eq!(headline.primary_concern.as_deref(), Some("Knee pain"));
    assert_eq!(headline.status.as_deref(), Some("Complete"));
}

// ════════════════════════════════════════════════════════════════════════════
// Calls that end early
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn hangup_mid_interview_stores_partial_report() {
    let (storage, _temp) = local_storage();
    let script = r#"{
        "metadata": {"phone_number": "+15550142"},
        "events": [
            {"say": "It's Sam.", "fields": {"patient_name": "Sam Lee", "appointment_date": "Friday"}},
            {"say": "Headaches.", "fields": {"chief_complaint": "Migraine"}},
            {"end": "hangup"}
        ]
    }"#;

    let result = run_script(script, storage.clone()).await;

    assert_eq!(result.end_reason, CallEndReason::Hangup);
    assert_eq!(result.status.as_str(), "Incomplete — call ended early");
    assert!(result.report.text().contains("Primary Concern: Migraine"));
    assert_eq!(storage.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn voicemail_before_any_answer_is_still_reported() {
    let (storage, _temp) = local_storage();
    let script = r#"{"metadata": "{phone_number: 5550177}", "events": [{"end": "voicemail"}]}"#;

    let result = run_script(script, storage.clone()).await;

    assert_eq!(result.end_reason, CallEndReason::Voicemail);
    assert_eq!(result.status, ReportStatus::IncompleteEndedEarly);
    assert_eq!(result.turns, 0);
    assert!(storage.read(&result.stored.file_name).await.is_ok());
}

#[tokio::test]
async fn transfer_request_is_reported_as_transferred() {
    let (storage, _temp) = local_storage();
    let script = r#"{
        "metadata": {"phone_number": "+15550100"},
        "events": [{"say": "I'd rather speak to a nurse.", "signal": "requested_human"}]
    }"#;

    let result = run_script(script, storage).await;

    assert_eq!(result.end_reason, CallEndReason::TransferRequested);
    assert_eq!(result.status, ReportStatus::IncompleteTransferred);
}
