//! Conversation module - the live transcript and the rules around it.
//!
//! - `message` - transcript entries and their lifecycle
//! - `transcript` - the message assembler
//! - `handoff` - human-agent handoff triggers
//! - `turn_state` - per-turn state machine
//! - `failure` - classified failures and their user-facing text
//! - `context` - session inputs and conversation seeds

mod context;
mod failure;
mod handoff;
mod message;
mod transcript;
mod turn_state;

pub use context::{ConversationSeed, SessionContext};
pub use failure::FailureKind;
pub use handoff::{HandoffDetector, HandoffReason};
pub use message::{Message, MessageRole, MessageStatus};
pub use transcript::{Transcript, TranscriptError};
pub use turn_state::TurnState;
