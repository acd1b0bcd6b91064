//! Chat session configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::streaming::DEFAULT_MAX_LINE_BYTES;

/// Chat session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cap on buffered bytes for one unterminated or parked line
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,

    /// Consecutive uncertain replies before a handoff is offered
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: u32,
}

impl SessionConfig {
    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_line_bytes < 1024 {
            return Err(ValidationError::LineBoundTooSmall);
        }
        if self.low_confidence_threshold == 0 {
            return Err(ValidationError::InvalidLowConfidenceThreshold);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
            low_confidence_threshold: default_low_confidence_threshold(),
        }
    }
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

fn default_low_confidence_threshold() -> u32 {
    2
}
