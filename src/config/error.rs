//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Endpoint URL must use http or https")]
    InvalidEndpointUrl,

    #[error("Invalid connect timeout")]
    InvalidTimeout,

    #[error("Line bound must be at least 1024 bytes")]
    LineBoundTooSmall,

    #[error("Low-confidence threshold must be at least 1")]
    InvalidLowConfidenceThreshold,
}
