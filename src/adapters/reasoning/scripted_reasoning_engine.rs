//! Scripted reasoning engine.
//!
//! Replays pre-extracted turn inputs in order and speaks fixed phrasing.
//! Drives offline runs of the call script format and integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::phrasing;
use crate::domain::screening::{Directive, TurnInput};
use crate::ports::{ReasoningEngine, ReasoningError, Transcript};

#[derive(Debug, Default)]
pub struct ScriptedReasoningEngine {
    inputs: Mutex<VecDeque<TurnInput>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedReasoningEngine {
    pub fn new(inputs: impl IntoIterator<Item = TurnInput>) -> Self {
        Self {
            inputs: Mutex::new(inputs.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Turn inputs not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.inputs).len()
    }

    /// Kinds of the directives extraction was asked about, in order.
    pub fn extraction_contexts(&self) -> Vec<String> {
        lock(&self.seen).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ReasoningEngine for ScriptedReasoningEngine {
    async fn extract_fields(
        &self,
        _transcript: &Transcript,
        pending: &Directive,
    ) -> Result<TurnInput, ReasoningError> {
        lock(&self.seen).push(pending.kind().to_string());
        lock(&self.inputs)
            .pop_front()
            .ok_or(ReasoningError::ScriptExhausted)
    }

    async fn generate_utterance(
        &self,
        directive: &Directive,
        _transcript: &Transcript,
    ) -> Result<String, ReasoningError> {
        Ok(phrasing::render(directive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::{field_ids, InterviewPhase, PromptDirective, PromptIntent};

    fn pending() -> Directive {
        Directive::Prompt(PromptDirective {
            phase: InterviewPhase::Hpi,
            intent: PromptIntent::Ask,
            guidance: InterviewPhase::Hpi.guidance(),
            target_fields: vec![field_ids::CHIEF_COMPLAINT],
            question_number: 2,
        })
    }

    #[tokio::test]
    async fn replays_inputs_then_reports_exhaustion() {
        let engine = ScriptedReasoningEngine::new(vec![
            TurnInput::empty().with_stated(field_ids::CHIEF_COMPLAINT, "Knee pain"),
        ]);
        let transcript = Transcript::new();

        let first = engine.extract_fields(&transcript, &pending()).await.unwrap();
        assert_eq!(first.extractions.len(), 1);
        assert_eq!(engine.remaining(), 0);

        let err = engine.extract_fields(&transcript, &pending()).await.unwrap_err();
        assert!(matches!(err, ReasoningError::ScriptExhausted));
        assert_eq!(engine.extraction_contexts(), vec!["prompt", "prompt"]);
    }

    #[tokio::test]
    async fn speaks_fixed_phrasing() {
        let engine = ScriptedReasoningEngine::default();
        let text = engine.generate_utterance(&pending(), &Transcript::new()).await.unwrap();
        assert_eq!(text, phrasing::question_for(field_ids::CHIEF_COMPLAINT));
    }
}
