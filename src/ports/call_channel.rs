//! Call Channel Port - The live call as seen by the interview.
//!
//! Audio transport, speech-to-text and text-to-speech live behind this
//! port. The interview only speaks text and waits for the next event.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::screening::CallEndReason;

/// Something that happened on the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// A transcribed patient utterance.
    Utterance(String),
    /// The call is over (hangup, timeout, voicemail detection).
    Ended(CallEndReason),
}

/// Port for the live call.
#[async_trait]
pub trait CallChannel: Send + Sync {
    /// Speaks text to the patient.
    async fn speak(&self, text: &str) -> Result<(), ChannelError>;

    /// Waits for the next patient utterance or end of call.
    async fn next_event(&self) -> Result<CallEvent, ChannelError>;
}

/// Call channel errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The transport dropped without a clean end event.
    #[error("call disconnected")]
    Disconnected,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChannelError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
