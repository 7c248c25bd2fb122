//! Scripted call channel.
//!
//! Plays back a fixed list of call events and records everything the
//! agent says. When the script runs out the call ends with a timeout,
//! the same as a silent line.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::screening::CallEndReason;
use crate::ports::{CallChannel, CallEvent, ChannelError};

#[derive(Debug, Default)]
pub struct ScriptedCallChannel {
    events: Mutex<VecDeque<CallEvent>>,
    spoken: Mutex<Vec<String>>,
    delay: Duration,
    fail_speaking: bool,
}

impl ScriptedCallChannel {
    pub fn new(events: impl IntoIterator<Item = CallEvent>) -> Self {
        Self {
            events: Mutex::new(events.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Builds a channel that delivers each utterance in order.
    pub fn from_utterances<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(utterances.into_iter().map(|u| CallEvent::Utterance(u.into())))
    }

    /// Waits this long before delivering each event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every `speak` fail, as a dropped audio leg would.
    pub fn with_failing_speech(mut self) -> Self {
        self.fail_speaking = true;
        self
    }

    /// Everything the agent said, in order.
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl CallChannel for ScriptedCallChannel {
    async fn speak(&self, text: &str) -> Result<(), ChannelError> {
        if self.fail_speaking {
            return Err(ChannelError::Disconnected);
        }
        lock(&self.spoken).push(text.to_string());
        Ok(())
    }

    async fn next_event(&self) -> Result<CallEvent, ChannelError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        Ok(lock(&self.events)
            .pop_front()
            .unwrap_or(CallEvent::Ended(CallEndReason::Timeout)))
    }
}
