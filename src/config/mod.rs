//! Application configuration module
//!
//! Configuration is read from environment variables with the
//! `ESTATE_CONCIERGE` prefix; nested values use double underscores.
//!
//! # Example
//!
//! ```no_run
//! use estate_concierge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Streaming from {}", config.ai.endpoint_url);
//! ```

mod ai;
mod error;
mod session;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Completion endpoint configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Chat session tuning
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `ESTATE_CONCIERGE__*` variables:
    ///
    /// - `ESTATE_CONCIERGE__AI__ENDPOINT_URL=...` -> `ai.endpoint_url`
    /// - `ESTATE_CONCIERGE__SESSION__MAX_LINE_BYTES=...` -> `session.max_line_bytes`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ESTATE_CONCIERGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("ESTATE_CONCIERGE__AI__ENDPOINT_URL");
        env::remove_var("ESTATE_CONCIERGE__AI__API_KEY");
        env::remove_var("ESTATE_CONCIERGE__AI__MODEL");
        env::remove_var("ESTATE_CONCIERGE__SESSION__MAX_LINE_BYTES");
        env::remove_var("ESTATE_CONCIERGE__SESSION__LOW_CONFIDENCE_THRESHOLD");
    }

    #[test]
    fn test_load_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.session.low_confidence_threshold, 2);
        assert!(config.ai.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ESTATE_CONCIERGE__AI__ENDPOINT_URL", "https://chat.example.com/v1/chat/completions");
        env::set_var("ESTATE_CONCIERGE__AI__MODEL", "listing-assistant");
        env::set_var("ESTATE_CONCIERGE__SESSION__MAX_LINE_BYTES", "4096");
        env::set_var("ESTATE_CONCIERGE__SESSION__LOW_CONFIDENCE_THRESHOLD", "3");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.ai.endpoint_url,
            "https://chat.example.com/v1/chat/completions"
        );
        assert_eq!(config.ai.model.as_deref(), Some("listing-assistant"));
        assert_eq!(config.session.max_line_bytes, 4096);
        assert_eq!(config.session.low_confidence_threshold, 3);
    }

    #[test]
    fn test_validate_reports_invalid_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ESTATE_CONCIERGE__SESSION__LOW_CONFIDENCE_THRESHOLD", "0");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidLowConfidenceThreshold)
        ));
    }
}
