//! Call Channel Adapters.
//!
//! - `ScriptedCallChannel` - Plays back a fixed list of call events
//! - `CallScript` - JSON call scripts that feed the scripted channel

mod call_script;
mod scripted_call_channel;

pub use call_script::{CallScript, ScriptError};
pub use scripted_call_channel::ScriptedCallChannel;
