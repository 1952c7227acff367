//! Model catalog configuration.
//!
//! The catalog lists the models a client may route to, each with its context
//! window. It is fixed when the client is built and never changes afterwards.
//!
//! # Configuration File Location
//!
//! [`ModelCatalog::load`] looks, in order, at:
//! 1. `RELAY_MODELS_CONFIG` environment variable
//! 2. `./models.toml` (current working directory)
//! 3. `~/.relay/models.toml` (user config)
//! 4. Built-in default catalog
//!
//! # Example Configuration
//!
//! ```toml
//! [[models]]
//! name = "gpt-3.5-turbo"
//! context_length = 4096
//!
//! [[models]]
//! name = "gpt-4o-mini"
//! context_length = 128000
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{LlmError, Result};

/// Environment variable pointing at a TOML model catalog.
pub const MODELS_CONFIG_ENV: &str = "RELAY_MODELS_CONFIG";

// ============================================================================
// Model Spec
// ============================================================================

/// A model the client can route requests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model identifier sent as the `model` field (e.g. "gpt-4o-mini").
    pub name: String,

    /// Maximum combined input + output tokens.
    #[serde(rename = "context_length", alias = "max_context_tokens")]
    pub max_context_tokens: usize,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, max_context_tokens: usize) -> Self {
        Self {
            name: name.into(),
            max_context_tokens,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Root structure of `models.toml`: the registered model set.
///
/// Registration order is preserved and serves as the tie-break when two
/// models share a context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin_defaults()
    }
}

impl ModelCatalog {
    /// Build a catalog from an explicit list, validating it.
    pub fn new(models: Vec<ModelSpec>) -> Result<Self> {
        let catalog = Self { models };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog from the default location (see module docs).
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(MODELS_CONFIG_ENV) {
            if Path::new(&path).exists() {
                return Self::from_file(&path);
            }
            debug!(path = %path, "{} points at a missing file, ignoring", MODELS_CONFIG_ENV);
        }

        let local_path = Path::new("models.toml");
        if local_path.exists() {
            return Self::from_file(local_path);
        }

        if let Some(home) = dirs::home_dir() {
            let user_path = home.join(".relay").join("models.toml");
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        Ok(Self::builtin_defaults())
    }

    /// Load and validate a catalog from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LlmError::ConfigError(format!(
                "failed to read model catalog '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Loaded model catalog");
        Self::from_toml(&content)
    }

    /// Parse and validate a catalog from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(toml_str)
            .map_err(|e| LlmError::ConfigError(format!("failed to parse model catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize the catalog to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LlmError::ConfigError(format!("failed to serialize model catalog: {}", e)))
    }

    /// OpenAI chat models, one per context-window tier.
    pub fn builtin_defaults() -> Self {
        Self {
            models: vec![
                ModelSpec::new("gpt-3.5-turbo", 4096),
                ModelSpec::new("gpt-3.5-turbo-16k", 16384),
                ModelSpec::new("gpt-4-32k", 32768),
                ModelSpec::new("gpt-4o-mini", 128000),
            ],
        }
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// The largest context window in the catalog (0 when empty).
    pub fn largest_context(&self) -> usize {
        self.models
            .iter()
            .map(|m| m.max_context_tokens)
            .max()
            .unwrap_or(0)
    }

    /// Check the catalog is usable: non-empty, positive windows, unique names.
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(LlmError::ConfigError(
                "model catalog must register at least one model".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(LlmError::ConfigError("model name must not be empty".to_string()));
            }
            if model.max_context_tokens == 0 {
                return Err(LlmError::ConfigError(format!(
                    "model '{}' must have a context window greater than zero",
                    model.name
                )));
            }
            if !seen.insert(model.name.as_str()) {
                return Err(LlmError::ConfigError(format!(
                    "duplicate model name: '{}'",
                    model.name
                )));
            }
        }

        Ok(())
    }
}
