//! Ports - Interfaces for external dependencies.
//!
//! - `AIProvider` - the streaming completion endpoint
//! - `ConversationStore` - append-only conversation persistence

mod ai_provider;
mod conversation_store;

pub use ai_provider::{
    AIError, AIProvider, ChatMessage, ChunkStream, CompletionRequest, FinishReason, ProviderInfo,
    RequestMetadata, StreamChunk,
};
pub use conversation_store::{ConversationStore, StoreError};
