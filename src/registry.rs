//! Provider Registry - name to constructor mapping
//!
//! # Purpose
//!
//! [`crate::AiClient`] picks its backend by name. Instead of a hardcoded
//! switch, names resolve through this registry, so a new provider is one
//! `register` call and the wrapper stays untouched.
//!
//! # Built-in Providers
//!
//! - **openai**: [`OpenAIProvider`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_llm::{ChatProvider, ClientConfig, MockProvider, ProviderRegistry};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register("mock", |config: ClientConfig| {
//!     Ok(Arc::new(MockProvider::from_config(&config)?) as Arc<dyn ChatProvider>)
//! });
//! assert_eq!(registry.names(), vec!["mock", "openai"]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{LlmError, Result};
use crate::providers::openai::{OpenAIProvider, PROVIDER_NAME as OPENAI};
use crate::traits::ChatProvider;

/// Builds a provider from a client config.
pub type ProviderConstructor =
    Arc<dyn Fn(ClientConfig) -> Result<Arc<dyn ChatProvider>> + Send + Sync>;

/// Registry of provider constructors keyed by lowercase name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Registry with the built-in providers.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(OPENAI, |config: ClientConfig| {
            Ok(Arc::new(OpenAIProvider::from_config(config)?) as Arc<dyn ChatProvider>)
        });
        registry
    }

    /// Register a provider constructor.
    ///
    /// If a provider with the same name exists, it is replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(ClientConfig) -> Result<Arc<dyn ChatProvider>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(normalize(&name.into()), Arc::new(constructor));
    }

    /// Check if a provider name is registered (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate the provider registered as `name`.
    pub fn create(&self, name: &str, config: ClientConfig) -> Result<Arc<dyn ChatProvider>> {
        let constructor = self
            .constructors
            .get(&normalize(name))
            .ok_or_else(|| LlmError::UnsupportedProvider(name.to_string()))?;
        debug!(provider = %name, "Creating provider");
        constructor(config)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    #[test]
    fn test_builtin_is_openai_only() {
        let registry = ProviderRegistry::new();
        assert_eq!(registry.names(), vec!["openai"]);
        assert!(registry.contains("openai"));
        assert!(registry.contains(" OpenAI "));
        assert!(!registry.contains("anthropic"));
    }

    #[test]
    fn test_create_openai() {
        let registry = ProviderRegistry::new();
        let provider = registry.create("openai", ClientConfig::new("sk-test")).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        match registry.create("gemini", ClientConfig::new("k")) {
            Err(LlmError::UnsupportedProvider(name)) => assert_eq!(name, "gemini"),
            Err(other) => panic!("Expected UnsupportedProvider, got {:?}", other),
            Ok(_) => panic!("Expected UnsupportedProvider, got a provider"),
        }
    }

    #[test]
    fn test_constructor_errors_propagate() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.create("openai", ClientConfig::new("")),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_register_and_replace() {
        let mut registry = ProviderRegistry::default();
        assert!(registry.names().is_empty());

        registry.register("Mock", |config: ClientConfig| {
            Ok(Arc::new(MockProvider::from_config(&config)?) as Arc<dyn ChatProvider>)
        });
        assert!(registry.contains("mock"));

        registry.register("mock", |_config: ClientConfig| {
            Err(LlmError::ConfigError("disabled".to_string()))
        });
        assert_eq!(registry.names().len(), 1);
        assert!(registry.create("mock", ClientConfig::new("k")).is_err());
    }
}
