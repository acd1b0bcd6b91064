//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, the state machine trait and validation errors
//! used by the conversation and streaming modules.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConversationId, MessageId, TurnId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
