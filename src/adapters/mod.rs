//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - completion providers (HTTP, mock)
//! - `storage` - conversation stores

pub mod ai;
pub mod storage;

pub use ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use storage::InMemoryConversationStore;
