//! Reasoning Engine Adapters.
//!
//! - `LlmReasoningEngine` - Extraction and phrasing through an `AIProvider`
//! - `ScriptedReasoningEngine` - Replays prepared turn inputs

mod llm_reasoning_engine;
pub mod phrasing;
mod response_parser;
mod scripted_reasoning_engine;

pub use llm_reasoning_engine::LlmReasoningEngine;
pub use response_parser::parse_turn_input;
pub use scripted_reasoning_engine::ScriptedReasoningEngine;
