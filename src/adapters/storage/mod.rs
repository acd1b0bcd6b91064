//! Storage adapters.
//!
//! - `InMemoryConversationStore` - conversation persistence for tests and the demo binary

mod in_memory_conversation_store;

pub use in_memory_conversation_store::{InMemoryConversationStore, StoredMessage};
