//! Model selection by context window.
//!
//! The selector routes a request to the smallest registered model whose
//! context window holds the whole request (input plus desired output).
//! Models are ordered ascending by window with a stable sort, so models
//! sharing a window are tried in registration order.

use tracing::debug;

use crate::error::{LlmError, Result};
use crate::model_config::{ModelCatalog, ModelSpec};

/// Picks the cheapest model that fits a token requirement.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    /// Ascending by `max_context_tokens`, ties in registration order.
    ordered: Vec<ModelSpec>,
}

impl ModelSelector {
    /// Build a selector over a validated catalog.
    pub fn new(catalog: &ModelCatalog) -> Result<Self> {
        catalog.validate()?;
        let mut ordered = catalog.models.clone();
        // sort_by_key is stable
        ordered.sort_by_key(|m| m.max_context_tokens);
        Ok(Self { ordered })
    }

    /// Return the first model whose window is at least `total_token_count`.
    ///
    /// Fails with [`LlmError::TokenLimitExceeded`] when no model is large enough.
    pub fn select_model(&self, total_token_count: usize) -> Result<&ModelSpec> {
        match self
            .ordered
            .iter()
            .find(|m| m.max_context_tokens >= total_token_count)
        {
            Some(model) => {
                debug!(
                    model = %model.name,
                    context = model.max_context_tokens,
                    required = total_token_count,
                    "Selected model"
                );
                Ok(model)
            }
            None => Err(LlmError::TokenLimitExceeded {
                required: total_token_count,
                max: self.largest_context(),
            }),
        }
    }

    /// The largest window any registered model offers.
    pub fn largest_context(&self) -> usize {
        self.ordered.last().map(|m| m.max_context_tokens).unwrap_or(0)
    }

    /// Models in selection order.
    pub fn models(&self) -> &[ModelSpec] {
        &self.ordered
    }
}
