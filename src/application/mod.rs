//! Application layer - orchestration over domain types and ports.
//!
//! - `session` - the per-conversation turn orchestrator

mod session;

pub use session::{ChatSession, SubmitError, TurnOutcome, TurnStatus};
