//! AI Provider Adapters.
//!
//! - `OpenAIProvider` - streaming chat-completions endpoint over HTTP
//! - `MockAIProvider` - scripted bodies for tests

mod mock_provider;
mod openai_provider;
mod sse_stream;

pub use mock_provider::{sse_body, sse_event, BodyChunk, MockAIProvider, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use sse_stream::decode_body;
