//! Completion endpoint configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Completion endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Streaming chat-completions URL
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Bearer key, if the endpoint requires one
    pub api_key: Option<String>,

    /// Model name forwarded in the request body
    pub model: Option<String>,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl AiConfig {
    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check if a non-empty key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__ENDPOINT_URL"));
        }
        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidEndpointUrl);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            api_key: None,
            model: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_endpoint_url() -> String {
    "http://localhost:8000/v1/chat/completions".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}
