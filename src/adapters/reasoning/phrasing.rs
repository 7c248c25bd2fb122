//! Deterministic phrasing for directives.
//!
//! Used verbatim by the scripted engine and as the fallback when a model
//! call fails. Confirmation read-backs always come from here so the patient
//! hears exactly the summary the report will contain.

use crate::domain::screening::{
    field_ids, CallEndReason, ConfirmationDirective, Directive, InterviewPhase, PromptDirective,
    PromptIntent,
};

const GREETING: &str = "Hello, this is the clinic calling ahead of your appointment.";

/// Plain question for one schema field.
pub fn question_for(field_id: &str) -> &'static str {
    match field_id {
        field_ids::PATIENT_NAME => "Could you please confirm your full name?",
        field_ids::APPOINTMENT_DATE => "Can you confirm the date of your upcoming appointment?",
        field_ids::EMERGENCY_CONTACT => "Who should we contact in case of an emergency?",
        field_ids::CHIEF_COMPLAINT => "What is the main reason for your visit?",
        field_ids::ONSET => "When did this start?",
        field_ids::PROVOCATION => "Does anything make it better or worse?",
        field_ids::QUALITY => "How would you describe it, for example sharp, dull or burning?",
        field_ids::RADIATION => "Does it spread anywhere else in your body?",
        field_ids::SEVERITY => "On a scale from 0 to 10, how bad is it?",
        field_ids::TIMING => "Is it constant, or does it come and go?",
        field_ids::ADDITIONAL_SYMPTOMS => "Have you noticed any other symptoms?",
        field_ids::MEDICAL_HISTORY => "Do you have any past medical conditions or surgeries?",
        field_ids::MEDICATIONS => "What medications are you currently taking?",
        field_ids::ALLERGIES => "Do you have any allergies to medications or anything else?",
        field_ids::FAMILY_HISTORY => "Do any medical conditions run in your family?",
        field_ids::SOCIAL_HISTORY => "Do you smoke, drink alcohol or use any other substances?",
        field_ids::ADDITIONAL_INFO => "Is there anything else you would like the doctor to know?",
        _ => "Could you tell me a little more about that?",
    }
}

/// Closing line for the end of a call, if anyone is still listening.
pub fn closing_line(reason: CallEndReason) -> Option<&'static str> {
    match reason {
        CallEndReason::Completed => Some(
            "Thank you for your time. The doctor will review this before your visit. Goodbye.",
        ),
        CallEndReason::TransferRequested => {
            Some("Of course. I will connect you with a member of our staff now.")
        }
        CallEndReason::SessionError => Some(
            "I'm sorry, we are having technical trouble. Someone from the clinic will follow up with you. Goodbye.",
        ),
        CallEndReason::Hangup | CallEndReason::Timeout | CallEndReason::Voicemail => None,
    }
}

/// Renders any directive as speech.
pub fn render(directive: &Directive) -> String {
    match directive {
        Directive::Prompt(prompt) => render_prompt(prompt),
        Directive::Confirmation(confirmation) => render_confirmation(confirmation),
        Directive::End(end) => closing_line(end.reason).unwrap_or_default().to_string(),
    }
}

fn render_prompt(prompt: &PromptDirective) -> String {
    let question = prompt
        .target_fields
        .first()
        .map(|field| question_for(field))
        .unwrap_or("Is there anything else you would like to add?");

    match prompt.intent {
        PromptIntent::Clarify => format!("Sorry, I didn't quite catch that. {}", question),
        PromptIntent::Ask
            if prompt.question_number == 1 && prompt.phase == InterviewPhase::Identification =>
        {
            format!("{} {}", GREETING, question)
        }
        PromptIntent::Ask => question.to_string(),
    }
}

fn render_confirmation(confirmation: &ConfirmationDirective) -> String {
    if confirmation.awaiting_correction {
        return "Of course. What would you like to correct?".to_string();
    }
    if confirmation.reentry == 0 {
        format!(
            "Before we finish, let me read back what I have.\n{}Is all of that correct?",
            confirmation.summary
        )
    } else {
        format!(
            "Thank you, I have updated that. Here is the revised summary.\n{}Is that correct now?",
            confirmation.summary
        )
    }
}
