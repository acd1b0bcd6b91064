//! Classified turn failures and their user-facing text.

use serde::{Deserialize, Serialize};

/// Why a turn ended without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Upstream answered 429.
    RateLimited,
    /// Upstream answered 402: usage credits are exhausted.
    QuotaExhausted,
    /// Upstream answered 5xx.
    Unavailable,
    /// No response, or the body broke off mid-stream.
    Transport,
    /// Any other non-success status.
    Generic,
}

impl FailureKind {
    /// Classifies a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExhausted,
            500..=599 => Self::Unavailable,
            _ => Self::Generic,
        }
    }

    /// Text rendered into the assistant placeholder.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited => {
                "We're getting a lot of questions right now. Please wait a moment and try again."
            }
            Self::QuotaExhausted => {
                "The assistant is temporarily unavailable. Please contact an agent directly."
            }
            Self::Unavailable => {
                "The assistant service is unavailable at the moment. Please try again shortly."
            }
            Self::Transport => {
                "We couldn't reach the assistant. Check your connection and try again."
            }
            Self::Generic => "Sorry, something went wrong while answering. Please try again.",
        }
    }
}
