//! Model-backed reasoning engine.
//!
//! Extraction asks the model for a JSON object of field values and an
//! optional signal. Utterances for prompts are generated by the model;
//! confirmations and closings use fixed phrasing so the read-back matches
//! the report exactly.

use async_trait::async_trait;
use std::sync::Arc;

use super::phrasing;
use super::response_parser::parse_turn_input;
use crate::domain::foundation::SessionId;
use crate::domain::screening::{Directive, FieldSchema, PromptDirective, PromptIntent, TurnInput};
use crate::ports::{
    AIProvider, CompletionRequest, Message, ReasoningEngine, ReasoningError, RequestMetadata,
    Speaker, Transcript,
};

/// Transcript lines sent with each request.
const MAX_HISTORY: usize = 20;
const EXTRACTION_MAX_TOKENS: u32 = 400;
const UTTERANCE_MAX_TOKENS: u32 = 120;

/// Reasoning engine backed by an `AIProvider`, scoped to one call.
pub struct LlmReasoningEngine {
    provider: Arc<dyn AIProvider>,
    schema: &'static FieldSchema,
    session_id: SessionId,
    temperature: Option<f32>,
}

impl LlmReasoningEngine {
    pub fn new(provider: Arc<dyn AIProvider>, session_id: SessionId) -> Self {
        Self {
            provider,
            schema: FieldSchema::standard(),
            session_id,
            temperature: None,
        }
    }

    /// Overrides the provider's default temperature for utterances.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn request(&self, purpose: &str) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            self.session_id,
            format!("{}-{}", self.session_id, purpose),
        ))
    }

    fn history(transcript: &Transcript) -> Vec<Message> {
        let entries = transcript.entries();
        let skip = entries.len().saturating_sub(MAX_HISTORY);
        entries[skip..]
            .iter()
            .map(|entry| match entry.speaker {
                Speaker::Agent => Message::agent(entry.text.clone()),
                Speaker::Patient => Message::patient(entry.text.clone()),
            })
            .collect()
    }

    fn field_lines(&self, ids: &[&'static str]) -> String {
        ids.iter()
            .filter_map(|id| self.schema.definition(id))
            .map(|def| format!("- {}: {}", def.id, def.label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extraction_prompt(&self, pending: &Directive) -> String {
        let all_ids: Vec<&'static str> = self.schema.definitions().iter().map(|d| d.id).collect();
        let focus = match pending {
            Directive::Prompt(prompt) => format!(
                "The agent just asked about:\n{}\n\nIf the patient refuses to answer, set \"signal\" to \"declined\".",
                self.field_lines(&prompt.target_fields)
            ),
            Directive::Confirmation(confirmation) if confirmation.awaiting_correction => {
                "The patient is giving a correction to the summary. Extract only the corrected values."
                    .to_string()
            }
            Directive::Confirmation(_) => {
                "The agent read back a summary. If the patient agrees, set \"signal\" to \"confirmed\". \
                 If they want to change something, set \"signal\" to \"declined\" and include any corrected values."
                    .to_string()
            }
            Directive::End(_) => "The call is ending.".to_string(),
        };

        format!(
            "You extract structured data from a pre-visit screening phone call.\n\
             Known fields:\n{}\n\n{}\n\n\
             Look only at the patient's latest reply. Respond with JSON only:\n\
             {{\"fields\": {{\"<field id>\": \"<value in the patient's words>\"}}, \"signal\": null}}\n\
             Use \"none\" when the patient denies having something. \
             Use signal \"requested_human\" if they ask for a person. \
             Omit fields the reply does not mention.",
            self.field_lines(&all_ids),
            focus
        )
    }

    fn utterance_prompt(&self, prompt: &PromptDirective) -> String {
        let labels: Vec<&str> = prompt
            .target_fields
            .iter()
            .filter_map(|id| self.schema.definition(id))
            .map(|def| def.label)
            .collect();
        let mut text = format!(
            "You are a friendly clinic assistant calling a patient before their appointment. {}\n\
             Ask exactly one short question, focusing on: {}.\n\
             Do not give medical advice. Reply with only the words to speak.",
            prompt.guidance,
            labels.first().copied().unwrap_or("anything else to add")
        );
        if prompt.intent == PromptIntent::Clarify {
            text.push_str("\nThe last answer was unclear. Rephrase the question more simply.");
        }
        if prompt.question_number == 1 {
            text.push_str("\nThis is the first thing you say on the call, so greet the patient first.");
        }
        text
    }
}

#[async_trait]
impl ReasoningEngine for LlmReasoningEngine {
    async fn extract_fields(
        &self,
        transcript: &Transcript,
        pending: &Directive,
    ) -> Result<TurnInput, ReasoningError> {
        let request = self
            .request("extract")
            .with_system_prompt(self.extraction_prompt(pending))
            .with_messages(Self::history(transcript))
            .with_max_tokens(EXTRACTION_MAX_TOKENS)
            .with_temperature(0.0)
            .with_json_output();

        let response = self.provider.complete(request).await?;
        let input = parse_turn_input(&response.content)?;

        tracing::debug!(
            session_id = %self.session_id,
            extracted = input.extractions.len(),
            signal = ?input.signal,
            tokens = response.usage.total(),
            "Extracted turn input"
        );
        Ok(input)
    }

    async fn generate_utterance(
        &self,
        directive: &Directive,
        transcript: &Transcript,
    ) -> Result<String, ReasoningError> {
        let prompt = match directive {
            Directive::Prompt(prompt) => prompt,
            other => return Ok(phrasing::render(other)),
        };

        let mut request = self
            .request("utter")
            .with_system_prompt(self.utterance_prompt(prompt))
            .with_messages(Self::history(transcript))
            .with_max_tokens(UTTERANCE_MAX_TOKENS);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        match self.provider.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                Ok(response.content.trim().to_string())
            }
            Ok(_) => Ok(phrasing::render(directive)),
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %err,
                    "Utterance generation failed, using fixed phrasing"
                );
                Ok(phrasing::render(directive))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::screening::{field_ids, ConfirmationDirective, InterviewPhase, PatientSignal};
    use crate::ports::{AIError, MessageRole};

    fn prompt_directive(intent: PromptIntent) -> Directive {
        Directive::Prompt(PromptDirective {
            phase: InterviewPhase::Hpi,
            intent,
            guidance: InterviewPhase::Hpi.guidance(),
            target_fields: vec![field_ids::ONSET, field_ids::PROVOCATION],
            question_number: 4,
        })
    }

    fn engine(provider: &MockAIProvider) -> LlmReasoningEngine {
        LlmReasoningEngine::new(Arc::new(provider.clone()), SessionId::new())
    }

    fn transcript() -> Transcript {
        let mut t = Transcript::new();
        t.push_agent("When did the pain start?");
        t.push_patient("About three days ago.");
        t
    }

    mod extraction {
        use super::*;

        #[tokio::test]
        async fn parses_model_json() {
            let provider = MockAIProvider::new()
                .with_response(r#"{"fields": {"onset": "three days ago"}, "signal": null}"#);

            let input = engine(&provider)
                .extract_fields(&transcript(), &prompt_directive(PromptIntent::Ask))
                .await
                .unwrap();

            assert_eq!(input.extractions.len(), 1);
            assert_eq!(input.extractions[0].field, "onset");
        }

        #[tokio::test]
        async fn sends_history_and_json_request() {
            let provider = MockAIProvider::new().with_response(r#"{"fields": {}}"#);

            engine(&provider)
                .extract_fields(&transcript(), &prompt_directive(PromptIntent::Ask))
                .await
                .unwrap();

            let call = &provider.get_calls()[0];
            assert!(call.json_output);
            assert_eq!(call.messages.len(), 2);
            assert_eq!(call.messages[1].role, MessageRole::Patient);
            assert!(call
                .system_prompt
                .as_deref()
                .unwrap()
                .contains("- onset: Onset"));
        }

        #[tokio::test]
        async fn confirmation_prompt_mentions_signal() {
            let provider = MockAIProvider::new().with_response(r#"{"signal": "confirmed"}"#);
            let pending = Directive::Confirmation(ConfirmationDirective {
                summary: String::new(),
                reentry: 0,
                awaiting_correction: false,
            });

            let input = engine(&provider).extract_fields(&transcript(), &pending).await.unwrap();

            assert_eq!(input.signal, Some(PatientSignal::Confirmed));
            let system = provider.get_calls()[0].system_prompt.clone().unwrap();
            assert!(system.contains("read back a summary"));
        }

        #[tokio::test]
        async fn provider_errors_propagate() {
            let provider = MockAIProvider::new().with_error(AIError::AuthenticationFailed);

            let err = engine(&provider)
                .extract_fields(&transcript(), &prompt_directive(PromptIntent::Ask))
                .await
                .unwrap_err();

            assert!(matches!(err, ReasoningError::Provider(_)));
        }

        #[tokio::test]
        async fn history_is_capped() {
            let provider = MockAIProvider::new().with_response(r#"{"fields": {}}"#);
            let mut long = Transcript::new();
            for i in 0..30 {
                long.push_agent(format!("q{}", i));
                long.push_patient(format!("a{}", i));
            }

            engine(&provider)
                .extract_fields(&long, &prompt_directive(PromptIntent::Ask))
                .await
                .unwrap();

            let call = &provider.get_calls()[0];
            assert_eq!(call.messages.len(), MAX_HISTORY);
            assert_eq!(call.messages.last().unwrap().content, "a29");
        }
    }

    mod utterances {
        use super::*;

        #[tokio::test]
        async fn prompts_use_model_text() {
            let provider = MockAIProvider::new().with_response("  When did it begin?  ");

            let text = engine(&provider)
                .generate_utterance(&prompt_directive(PromptIntent::Ask), &transcript())
                .await
                .unwrap();

            assert_eq!(text, "When did it begin?");
        }

        #[tokio::test]
        async fn clarify_asks_for_rephrasing() {
            let provider = MockAIProvider::new().with_response("Sorry, when did it start?");

            engine(&provider)
                .generate_utterance(&prompt_directive(PromptIntent::Clarify), &transcript())
                .await
                .unwrap();

            let system = provider.get_calls()[0].system_prompt.clone().unwrap();
            assert!(system.contains("Rephrase"));
        }

        #[tokio::test]
        async fn provider_failure_falls_back_to_fixed_phrasing() {
            let provider =
                MockAIProvider::new().with_error(AIError::unavailable("down"));

            let text = engine(&provider)
                .generate_utterance(&prompt_directive(PromptIntent::Ask), &transcript())
                .await
                .unwrap();

            assert_eq!(text, phrasing::question_for(field_ids::ONSET));
        }

        #[tokio::test]
        async fn confirmation_never_calls_the_model() {
            let provider = MockAIProvider::new();
            let directive = Directive::Confirmation(ConfirmationDirective {
                summary: "Onset: Monday\n".to_string(),
                reentry: 0,
                awaiting_correction: false,
            });

            let text = engine(&provider).generate_utterance(&directive, &transcript()).await.unwrap();

            assert!(text.contains("Onset: Monday"));
            assert_eq!(provider.call_count(), 0);
        }
    }
}
