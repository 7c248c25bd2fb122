//! AI Provider Adapters.
//!
//! - `GeminiProvider` - Google Gemini models
//! - `MockAIProvider` - Configurable mock for testing

mod gemini_provider;
mod mock_provider;

pub use gemini_provider::{
    GeminiConfig, GeminiProvider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
    DEFAULT_GEMINI_TEMPERATURE,
};
pub use mock_provider::MockAIProvider;
