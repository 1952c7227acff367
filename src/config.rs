//! Client configuration.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY`: API key (required)
//! - `OPENAI_API_BASE`: base URL override (default `https://api.openai.com/v1`)
//! - `RELAY_TIMEOUT_SECONDS`: optional request timeout
//! - `RELAY_MODELS_CONFIG`: path to a TOML model catalog (see [`ModelCatalog::load`])

use crate::error::{LlmError, Result};
use crate::model_config::ModelCatalog;
use crate::request::{RequestOptions, DEFAULT_OUTPUT_TOKENS};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_API_BASE";
pub const TIMEOUT_ENV: &str = "RELAY_TIMEOUT_SECONDS";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Everything a provider needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token for the provider.
    pub api_key: String,

    /// API root; `/chat/completions` is appended.
    pub base_url: String,

    /// Whole-request timeout. `None` leaves timing to the caller.
    pub timeout_seconds: Option<u64>,

    /// Output budget when a call does not set `max_tokens`.
    pub default_output_tokens: usize,

    /// Registered models.
    pub models: ModelCatalog,

    /// Options used by calls that do not pass their own.
    pub options: RequestOptions,
}

impl ClientConfig {
    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
            default_output_tokens: DEFAULT_OUTPUT_TOKENS,
            models: ModelCatalog::builtin_defaults(),
            options: RequestOptions::default(),
        }
    }

    /// Read the config from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let mut config = Self::new(api_key);

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                LlmError::ConfigError(format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_ENV, raw))
            })?;
            config.timeout_seconds = Some(secs);
        }

        config.models = ModelCatalog::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = Some(secs);
        self
    }

    pub fn with_default_output_tokens(mut self, tokens: usize) -> Self {
        self.default_output_tokens = tokens;
        self
    }

    pub fn with_models(mut self, models: ModelCatalog) -> Self {
        self.models = models;
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Check the config can back a client.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        if self.base_url.trim().is_empty() {
            return Err(LlmError::ConfigError("base URL must not be empty".to_string()));
        }
        if self.default_output_tokens == 0 {
            return Err(LlmError::ConfigError(
                "default output tokens must be greater than zero".to_string(),
            ));
        }
        self.models.validate()?;
        self.options.validate()
    }

    /// `<base_url>/chat/completions`.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Show only a short prefix of an API key, for logs.
pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [API_KEY_ENV, BASE_URL_ENV, TIMEOUT_ENV, crate::model_config::MODELS_CONFIG_ENV] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_new_defaults() {
        let config = ClientConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_seconds, None);
        assert_eq!(config.default_output_tokens, 1000);
        assert_eq!(config.options, RequestOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            ClientConfig::new("").validate(),
            Err(LlmError::MissingApiKey)
        ));
        assert!(matches!(
            ClientConfig::new("   ").validate(),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_invalid_default_options() {
        let config = ClientConfig::new("k").with_options(RequestOptions::default().with_top_p(5.0));
        assert!(matches!(config.validate(), Err(LlmError::InvalidRequest(_))));
    }

    #[test]
    fn test_chat_completions_url() {
        let config = ClientConfig::new("k").with_base_url("http://localhost:1234/v1/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-abcdefghijkl"), "sk-abc***");
        assert_eq!(mask_api_key("short"), "***");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(API_KEY_ENV, "sk-env");
        std::env::set_var(BASE_URL_ENV, "http://proxy.local/v1");
        std::env::set_var(TIMEOUT_ENV, "30");

        let config = ClientConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.base_url, "http://proxy.local/v1");
        assert_eq!(config.timeout_seconds, Some(30));
    }

    #[test]
    #[serial]
    fn test_from_env_without_key() {
        clear_env();
        assert!(matches!(
            ClientConfig::from_env(),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_bad_timeout() {
        clear_env();
        std::env::set_var(API_KEY_ENV, "sk-env");
        std::env::set_var(TIMEOUT_ENV, "soon");
        let result = ClientConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }
}
