//! Domain layer containing the engine's pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, state machine trait)
//! - `streaming` - Event-stream framing and delta extraction
//! - `conversation` - Transcript assembly, handoff detection, turn lifecycle

pub mod conversation;
pub mod foundation;
pub mod streaming;
