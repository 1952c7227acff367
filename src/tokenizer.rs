//! Token estimation.
//!
//! The default estimator counts maximal runs of non-whitespace characters.
//! It is an approximation, not a tokenizer: budgets built on it should be
//! read as heuristics. [`BpeEstimator`] offers a closer count for
//! OpenAI-family models when that matters to the caller.

use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::{LlmError, Result};

/// Approximates how many tokens a text consumes.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the token count of `text`. Must be deterministic.
    fn estimate(&self, text: &str) -> usize;
}

/// Whitespace-delimited word count.
///
/// ```
/// use relay_llm::tokenizer::{TokenEstimator, WordCountEstimator};
///
/// assert_eq!(WordCountEstimator.estimate("Hello, how are you?"), 4);
/// assert_eq!(WordCountEstimator.estimate("   "), 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountEstimator;

impl TokenEstimator for WordCountEstimator {
    fn estimate(&self, text: &str) -> usize {
        estimate(text)
    }
}

/// Count the whitespace-delimited words in `text`.
pub fn estimate(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte-pair-encoding estimator backed by the cl100k_base vocabulary.
pub struct BpeEstimator {
    encoder: CoreBPE,
}

impl BpeEstimator {
    /// Load the cl100k_base vocabulary.
    pub fn new() -> Result<Self> {
        let encoder = cl100k_base()
            .map_err(|e| LlmError::ConfigError(format!("failed to load cl100k tokenizer: {}", e)))?;
        Ok(Self { encoder })
    }
}

impl std::fmt::Debug for BpeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeEstimator")
            .field("vocabulary", &"cl100k_base")
            .finish()
    }
}

impl TokenEstimator for BpeEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.encoder.encode_with_special_tokens(text).len()
    }
}
