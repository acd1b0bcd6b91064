//! Estate Concierge - streaming chat sessions for the property marketplace.
//!
//! Decodes event-stream completions into a live transcript, watches for moments
//! when a caller should be offered a human agent, and records the
//! conversation through a pluggable store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
