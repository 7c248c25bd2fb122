//! Mock AI Provider for testing.
//!
//! Replies are queued up front and handed out in order; once the queue is
//! empty every call gets `"Mock response"`. Every request is kept so tests
//! can inspect the prompts the reasoning adapter built.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

const MOCK_MODEL: &str = "mock-model";
const FALLBACK_REPLY: &str = "Mock response";

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Result<String, AIError>>,
    requests: Vec<CompletionRequest>,
}

/// Mock AI provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockAIProvider {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.state().replies.push_back(Ok(content.into()));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: AIError) -> Self {
        self.state().replies.push_back(Err(error));
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Every request received so far, oldest first.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.state().requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let reply = {
            let mut state = self.state();
            state.requests.push(request);
            state
                .replies
                .pop_front()
                .unwrap_or_else(|| Ok(FALLBACK_REPLY.to_string()))
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let content = reply?;
        Ok(CompletionResponse {
            usage: TokenUsage::new(10, content.len() as u32),
            content,
            model: MOCK_MODEL.to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", MOCK_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{MessageRole, RequestMetadata};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), "test"))
            .with_message(MessageRole::Patient, text)
    }

    #[tokio::test]
    async fn replies_in_queue_order_then_fallback() {
        let provider = MockAIProvider::new().with_response("first").with_response("second");

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "first");
        assert_eq!(provider.complete(request("b")).await.unwrap().content, "second");
        assert_eq!(provider.complete(request("c")).await.unwrap().content, "Mock response");
    }

    #[tokio::test]
    async fn queued_error_is_returned_once() {
        let provider = MockAIProvider::new().with_error(AIError::rate_limited(30));

        let err = provider.complete(request("a")).await.unwrap_err();
        assert_eq!(err, AIError::RateLimited { retry_after_secs: 30 });
        assert!(provider.complete(request("b")).await.is_ok());
    }

    #[tokio::test]
    async fn records_requests_even_when_failing() {
        let provider = MockAIProvider::new().with_error(AIError::AuthenticationFailed);
        assert_eq!(provider.call_count(), 0);

        let _ = provider.complete(request("It started Monday")).await;

        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.get_calls()[0].messages[0].content, "It started Monday");
    }

    #[tokio::test]
    async fn clones_share_the_queue() {
        let provider = MockAIProvider::new().with_response("only");
        let clone = provider.clone();

        assert_eq!(clone.complete(request("a")).await.unwrap().content, "only");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn waits_for_configured_delay() {
        let provider = MockAIProvider::new().with_delay(Duration::from_millis(20));

        let start = std::time::Instant::now();
        provider.complete(request("a")).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
