//! Turn state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where the session is within the current user turn.
///
/// - `Idle`: ready for a submit
/// - `Sending`: user turn recorded, completion request in flight
/// - `Streaming`: response accepted, deltas arriving
/// - `Finalizing`: answer frozen, persistence and handoff pending
/// - `Errored`: request or stream failed, error text being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    Sending,
    Streaming,
    Finalizing,
    Errored,
}

impl TurnState {
    /// Returns true if a new submit may start a turn.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl StateMachine for TurnState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TurnState::*;
        matches!(
            (self, target),
            (Idle, Sending)
                | (Sending, Streaming)
                | (Sending, Errored)
                | (Streaming, Finalizing)
                | (Streaming, Errored)
                | (Finalizing, Idle)
                | (Errored, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TurnState::*;
        match self {
            Idle => vec![Sending],
            Sending => vec![Streaming, Errored],
            Streaming => vec![Finalizing, Errored],
            Finalizing => vec![Idle],
            Errored => vec![Idle],
        }
    }
}
