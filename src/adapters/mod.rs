//! Adapters - Implementations of the port interfaces.
//!
//! - `ai` - Language model providers
//! - `reasoning` - Field extraction and utterance generation
//! - `channel` - Call channels
//! - `storage` - Report persistence

pub mod ai;
pub mod channel;
pub mod reasoning;
pub mod storage;
