//! Provider-selection wrapper.
//!
//! [`AiClient`] is the entry point most callers need: give it an API key and
//! a provider name, then send messages with or without an attached file.
//!
//! ```ignore
//! use relay_llm::AiClient;
//!
//! let client = AiClient::new(std::env::var("OPENAI_API_KEY")?, "openai")?;
//! let answer = client.send("Hello, how are you?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ClientConfig;
use crate::error::{LlmError, Result};
use crate::extract::ExtractedFile;
use crate::registry::ProviderRegistry;
use crate::request::RequestOptions;
use crate::traits::ChatProvider;

/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = "openai";

/// A configured client bound to one provider.
///
/// Holds no per-call state; clones share the provider and calls may run
/// concurrently.
#[derive(Clone)]
pub struct AiClient {
    provider: Arc<dyn ChatProvider>,
    default_options: RequestOptions,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("provider", &self.provider.name())
            .field("default_options", &self.default_options)
            .finish()
    }
}

impl AiClient {
    /// Client for `provider` with default settings.
    ///
    /// Fails with `MissingApiKey` on an empty key, then with
    /// `UnsupportedProvider` on an unknown name.
    pub fn new(api_key: impl Into<String>, provider: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key), provider)
    }

    /// OpenAI client with default settings.
    pub fn openai(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_PROVIDER)
    }

    /// Client configured from the environment (see [`ClientConfig::from_env`]).
    pub fn from_env(provider: &str) -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?, provider)
    }

    /// Client from an explicit config, resolved through the built-in registry.
    pub fn with_config(config: ClientConfig, provider: &str) -> Result<Self> {
        Self::with_registry(&ProviderRegistry::new(), config, provider)
    }

    /// Client resolved through a caller-supplied registry.
    pub fn with_registry(
        registry: &ProviderRegistry,
        config: ClientConfig,
        provider: &str,
    ) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        config.options.validate()?;

        let default_options = config.options.clone();
        let provider = registry.create(provider, config)?;
        info!(provider = provider.name(), "AI client ready");

        Ok(Self {
            provider,
            default_options,
        })
    }

    /// Wrap an already-built provider.
    pub fn from_provider(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            default_options: RequestOptions::default(),
        }
    }

    /// Name of the bound provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Options used by [`AiClient::send`] and [`AiClient::send_with_file`].
    pub fn default_options(&self) -> &RequestOptions {
        &self.default_options
    }

    /// Send a message with explicit options and an optional attachment.
    pub async fn send_message(
        &self,
        message: &str,
        options: &RequestOptions,
        file_path: Option<&Path>,
    ) -> Result<String> {
        self.provider.send_message(message, options, file_path).await
    }

    /// Send a message with the default options.
    pub async fn send(&self, message: &str) -> Result<String> {
        self.send_message(message, &self.default_options, None)
            .await
    }

    /// Send a message with a file attached, using the default options.
    pub async fn send_with_file(&self, message: &str, file_path: impl AsRef<Path>) -> Result<String> {
        self.send_message(message, &self.default_options, Some(file_path.as_ref()))
            .await
    }

    /// Extract a file's text without sending anything.
    pub async fn process_file(&self, file_path: impl AsRef<Path>) -> Result<ExtractedFile> {
        self.provider.process_file(file_path.as_ref()).await
    }
}
