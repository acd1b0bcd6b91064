//! OpenAI-compatible Provider - Implementation of AIProvider for a streaming
//! chat-completions endpoint.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new("https://chat.example.com/v1/chat/completions")
//!     .with_api_key("sk-...")
//!     .with_model("listing-assistant");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! The request always sets `stream: true`. The response body is decoded by
//! [`SseDecoder`](crate::domain::streaming::SseDecoder) until the `[DONE]`
//! sentinel or the end of the body. Only a connect timeout is applied; a
//! response may stream for as long as the endpoint keeps it open.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::sse_stream::decode_body;
use crate::config::AiConfig;
use crate::domain::streaming::DEFAULT_MAX_LINE_BYTES;
use crate::ports::{AIError, AIProvider, ChunkStream, CompletionRequest, ProviderInfo};

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Full URL of the streaming completions endpoint.
    pub endpoint_url: String,
    /// Bearer key, when the endpoint requires one.
    api_key: Option<Secret<String>>,
    /// Model forwarded in the request body.
    pub model: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Cap on one buffered event-stream line.
    pub max_line_bytes: usize,
}

impl OpenAIConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key: None,
            model: None,
            connect_timeout: Duration::from_secs(10),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Sets the bearer key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    /// Sets the model to request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the line bound used while decoding the body.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

impl From<&AiConfig> for OpenAIConfig {
    fn from(config: &AiConfig) -> Self {
        let mut out = OpenAIConfig::new(config.endpoint_url.clone())
            .with_connect_timeout(config.connect_timeout());
        if config.has_api_key() {
            if let Some(key) = &config.api_key {
                out = out.with_api_key(key.clone());
            }
        }
        if let Some(model) = &config.model {
            out = out.with_model(model.clone());
        }
        out
    }
}

/// OpenAI-compatible streaming provider.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts a request to the wire format.
    fn to_wire_request<'a>(&'a self, request: &'a CompletionRequest) -> WireRequest<'a> {
        WireRequest {
            model: self.config.model.as_deref(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
            subject: request.subject.as_ref(),
            preferences: request.preferences.as_ref(),
        }
    }

    /// Sends the streaming request.
    async fn send_streaming_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<Response, AIError> {
        let body = self.to_wire_request(request);

        let mut builder = self
            .client
            .post(&self.config.endpoint_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body);
        if let Some(key) = self.config.api_key() {
            builder = builder.bearer_auth(key);
        }

        builder.send().await.map_err(|e| {
            if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })
    }

    /// Classifies a non-success status.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Completion endpoint rejected request");
        Err(AIError::from_status(status.as_u16(), error_body))
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        tracing::debug!(
            turn = %request.metadata.turn,
            messages = request.messages.len(),
            "Opening completion stream"
        );
        let response = self.send_streaming_request(&request).await?;
        let response = Self::handle_response_status(response).await?;

        Ok(decode_body(
            Box::pin(response.bytes_stream()),
            self.config.max_line_bytes,
        ))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai-compatible", self.config.model.clone())
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferences: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}
