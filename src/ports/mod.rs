//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the interview engine and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Hosted language model completions
//! - `ReasoningEngine` - Field extraction and utterance generation
//! - `CallChannel` - The live call (speech in, speech out)
//! - `ReportStorage` - Durable storage for finished reports

mod ai_provider;
mod call_channel;
mod reasoning_engine;
mod report_storage;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use call_channel::{CallChannel, CallEvent, ChannelError};
pub use reasoning_engine::{
    ReasoningEngine, ReasoningError, Speaker, Transcript, TranscriptEntry,
};
pub use report_storage::{
    ReportFileName, ReportStorage, ReportSummary, StorageError, StoredReport,
};
