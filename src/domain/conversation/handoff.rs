//! Detection of moments where the caller should be offered a human agent.
//!
//! Two independent checks exist. User intent is judged on the submitted text
//! before the completion request goes out, so it never depends on the
//! answer. Low confidence can only be judged on a finalized answer.

use serde::{Deserialize, Serialize};

/// Why a handoff offer was made. Carried on the offer message only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffReason {
    /// The caller asked for a person.
    ExplicitRequest,
    /// The caller is visibly frustrated with the assistant.
    Frustration,
    /// The caller wants to act on a listing (viewing, offer, financing).
    TransactionIntent,
    /// The assistant has hedged repeatedly.
    LowConfidence,
}

impl HandoffReason {
    /// Machine-readable name, as stored in message metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitRequest => "explicit_request",
            Self::Frustration => "frustration",
            Self::TransactionIntent => "transaction_intent",
            Self::LowConfidence => "low_confidence",
        }
    }

    /// Returns true for reasons derived from the caller's own words.
    pub fn is_user_intent(&self) -> bool {
        !matches!(self, Self::LowConfidence)
    }
}

const EXPLICIT_REQUEST_PHRASES: &[&str] = &[
    "talk to a human",
    "speak to a human",
    "speak with a human",
    "talk to a person",
    "speak to a person",
    "real person",
    "human agent",
    "live agent",
    "talk to an agent",
    "speak to an agent",
    "speak with an agent",
    "contact an agent",
    "talk to someone",
    "representative",
    "customer service",
];

const FRUSTRATION_PHRASES: &[&str] = &[
    "this is useless",
    "you're useless",
    "not helpful",
    "you're not helping",
    "you are not helping",
    "waste of time",
    "frustrated",
    "frustrating",
    "makes no sense",
    "doesn't make sense",
];

const TRANSACTION_INTENT_PHRASES: &[&str] = &[
    "schedule a viewing",
    "book a viewing",
    "arrange a viewing",
    "schedule a tour",
    "book a tour",
    "make an offer",
    "submit an offer",
    "put in an offer",
    "mortgage pre-approval",
    "sign the lease",
    "sign a lease",
    "negotiate the price",
];

const LOW_CONFIDENCE_PHRASES: &[&str] = &[
    "i'm not sure",
    "i am not sure",
    "i don't know",
    "i do not know",
    "i don't have",
    "i do not have",
    "i cannot",
    "i can't",
    "i'm unable",
    "i am unable",
    "not certain",
    "no information",
];

/// Pure, deterministic classifier for handoff triggers.
#[derive(Debug, Clone)]
pub struct HandoffDetector {
    explicit: Vec<String>,
    frustration: Vec<String>,
    transaction: Vec<String>,
    low_confidence: Vec<String>,
    low_confidence_threshold: u32,
}

impl Default for HandoffDetector {
    fn default() -> Self {
        Self {
            explicit: normalize_all(EXPLICIT_REQUEST_PHRASES),
            frustration: normalize_all(FRUSTRATION_PHRASES),
            transaction: normalize_all(TRANSACTION_INTENT_PHRASES),
            low_confidence: normalize_all(LOW_CONFIDENCE_PHRASES),
            low_confidence_threshold: 2,
        }
    }
}

impl HandoffDetector {
    /// Sets how many consecutive hedged answers trigger an offer (min 1).
    pub fn with_low_confidence_threshold(mut self, threshold: u32) -> Self {
        self.low_confidence_threshold = threshold.max(1);
        self
    }

    /// Returns the configured low-confidence threshold.
    pub fn low_confidence_threshold(&self) -> u32 {
        self.low_confidence_threshold
    }

    /// Classifies a user utterance.
    ///
    /// When several reasons match, the explicit request wins over
    /// frustration, which wins over transaction intent.
    pub fn detect(&self, user_text: &str) -> Option<HandoffReason> {
        let haystack = normalize(user_text);
        if haystack.trim().is_empty() {
            return None;
        }
        if contains_any(&haystack, &self.explicit) {
            Some(HandoffReason::ExplicitRequest)
        } else if contains_any(&haystack, &self.frustration) {
            Some(HandoffReason::Frustration)
        } else if contains_any(&haystack, &self.transaction) {
            Some(HandoffReason::TransactionIntent)
        } else {
            None
        }
    }

    /// Returns true if a finalized answer hedges.
    pub fn is_low_confidence(&self, assistant_text: &str) -> bool {
        let haystack = normalize(assistant_text);
        !haystack.trim().is_empty() && contains_any(&haystack, &self.low_confidence)
    }

    /// Returns true if this finalized answer completes a streak of hedged
    /// answers long enough to warrant an offer.
    ///
    /// `prior_streak` is the number of consecutive hedged answers before
    /// this one.
    pub fn should_trigger_low_confidence(&self, assistant_text: &str, prior_streak: u32) -> bool {
        self.is_low_confidence(assistant_text)
            && prior_streak.saturating_add(1) >= self.low_confidence_threshold
    }

    /// Picks at most one offer for a turn. User intent takes priority.
    pub fn select_offer(
        user_intent: Option<HandoffReason>,
        low_confidence: bool,
    ) -> Option<HandoffReason> {
        user_intent.or(low_confidence.then_some(HandoffReason::LowConfidence))
    }
}

/// Lower-cases and reduces text to space-separated alphanumeric words,
/// padded with a space on each side for word-boundary matching.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_was_space = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if !last_was_space {
        out.push(' ');
    }
    out
}

fn normalize_all(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| normalize(p)).collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
