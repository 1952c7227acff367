//! Request options and token-budgeted request construction.
//!
//! [`RequestBuilder::build`] is where the budget is decided:
//!
//! ```text
//! full message ──► estimate input tokens ──┐
//! options.max_tokens or default (1000) ────┴─► total ──► ModelSelector ──► CompletionRequest
//! ```
//!
//! The output budget and the model are derived per call, so the same client
//! moves from a small model to a large one as messages and attachments grow.
//! When no model fits, the build fails with `TokenLimitExceeded` and nothing
//! is sent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::extract::ExtractedFile;
use crate::model_config::ModelCatalog;
use crate::selector::ModelSelector;
use crate::tokenizer::{TokenEstimator, WordCountEstimator};
use crate::traits::ChatMessage;

/// Output budget used when the caller does not set `max_tokens`.
pub const DEFAULT_OUTPUT_TOKENS: usize = 1000;

/// Placed between the user's message and the attachment block.
pub const ATTACHMENT_SEPARATOR: &str = "\n\n---\n";

// ============================================================================
// Request Options
// ============================================================================

/// Sampling and output options for a completion request.
///
/// Every field has a default; deserializing a partial document fills the rest.
///
/// | field | default |
/// |-------|---------|
/// | `temperature` | 0.7 |
/// | `top_p` | 1.0 |
/// | `n` | 1 |
/// | `stream` | false |
/// | `stop` | none |
/// | `presence_penalty` | 0.0 |
/// | `frequency_penalty` | 0.0 |
/// | `logit_bias` | none |
/// | `user` | none |
/// | `max_tokens` | derived ([`DEFAULT_OUTPUT_TOKENS`]) |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,

    /// Nucleus sampling mass, 0.0 to 1.0.
    pub top_p: f32,

    /// Number of completions to generate. Only the first is returned.
    pub n: u32,

    /// Ask the server to stream the answer as server-sent events.
    pub stream: bool,

    /// Up to four stop sequences.
    pub stop: Option<Vec<String>>,

    /// -2.0 to 2.0.
    pub presence_penalty: f32,

    /// -2.0 to 2.0.
    pub frequency_penalty: f32,

    /// Token id -> bias (-100 to 100).
    pub logit_bias: Option<BTreeMap<String, i32>>,

    /// End-user identifier forwarded to the provider.
    pub user: Option<String>,

    /// Output token budget. `None` means [`DEFAULT_OUTPUT_TOKENS`].
    pub max_tokens: Option<usize>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            n: 1,
            stream: false,
            stop: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            logit_bias: None,
            user: None,
            max_tokens: None,
        }
    }
}

impl RequestOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = penalty;
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty;
        self
    }

    pub fn with_logit_bias(mut self, bias: BTreeMap<String, i32>) -> Self {
        self.logit_bias = Some(bias);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Check every field is within the range the chat-completions API accepts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(LlmError::InvalidRequest(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }
        if self.n == 0 {
            return Err(LlmError::InvalidRequest("n must be at least 1".to_string()));
        }
        for (name, value) in [
            ("presence_penalty", self.presence_penalty),
            ("frequency_penalty", self.frequency_penalty),
        ] {
            if !(-2.0..=2.0).contains(&value) {
                return Err(LlmError::InvalidRequest(format!(
                    "{} must be between -2 and 2, got {}",
                    name, value
                )));
            }
        }
        if let Some(stop) = &self.stop {
            if stop.len() > 4 {
                return Err(LlmError::InvalidRequest(format!(
                    "at most 4 stop sequences are allowed, got {}",
                    stop.len()
                )));
            }
        }
        if let Some(bias) = &self.logit_bias {
            if let Some((token, value)) = bias.iter().find(|(_, v)| !(-100..=100).contains(*v)) {
                return Err(LlmError::InvalidRequest(format!(
                    "logit_bias for token {} must be between -100 and 100, got {}",
                    token, value
                )));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(LlmError::InvalidRequest(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Completion Request
// ============================================================================

/// A fully resolved chat-completions request body.
///
/// Built fresh for each call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Name of the selected model.
    pub model: String,
    /// A single user message holding the full message.
    pub messages: Vec<ChatMessage>,
    /// Desired output tokens.
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<BTreeMap<String, i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Estimated input tokens of the full message.
    #[serde(skip)]
    pub input_tokens: usize,
    /// Context window of the selected model.
    #[serde(skip)]
    pub context_window: usize,
}

impl CompletionRequest {
    /// The message text actually sent (user message plus any attachment).
    pub fn full_message(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Input estimate plus output budget.
    pub fn total_tokens(&self) -> usize {
        self.input_tokens + self.max_tokens
    }
}

// ============================================================================
// Request Builder
// ============================================================================

/// Merges message, attachment and options into a [`CompletionRequest`].
#[derive(Clone)]
pub struct RequestBuilder {
    selector: ModelSelector,
    estimator: Arc<dyn TokenEstimator>,
    default_output_tokens: usize,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("selector", &self.selector)
            .field("default_output_tokens", &self.default_output_tokens)
            .finish()
    }
}

impl RequestBuilder {
    /// Builder over `catalog` using the word-count estimator.
    pub fn new(catalog: &ModelCatalog) -> Result<Self> {
        Ok(Self {
            selector: ModelSelector::new(catalog)?,
            estimator: Arc::new(WordCountEstimator),
            default_output_tokens: DEFAULT_OUTPUT_TOKENS,
        })
    }

    /// Replace the token estimator.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Change the output budget used when `max_tokens` is unset.
    pub fn with_default_output_tokens(mut self, tokens: usize) -> Self {
        self.default_output_tokens = tokens;
        self
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Build a request for `message`, with `attachment` appended if given.
    pub fn build(
        &self,
        message: &str,
        options: &RequestOptions,
        attachment: Option<&ExtractedFile>,
    ) -> Result<CompletionRequest> {
        options.validate()?;

        let full_message = compose_message(message, attachment);
        let input_tokens = self.estimator.estimate(&full_message);
        let output_tokens = options.max_tokens.unwrap_or(self.default_output_tokens);
        let total = input_tokens.saturating_add(output_tokens);

        let model = self.selector.select_model(total)?;

        debug!(
            model = %model.name,
            input_tokens,
            output_tokens,
            context_window = model.max_context_tokens,
            "Built completion request"
        );

        Ok(CompletionRequest {
            model: model.name.clone(),
            messages: vec![ChatMessage::user(full_message)],
            max_tokens: output_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            n: options.n,
            stream: options.stream,
            stop: options.stop.clone(),
            presence_penalty: options.presence_penalty,
            frequency_penalty: options.frequency_penalty,
            logit_bias: options.logit_bias.clone(),
            user: options.user.clone(),
            input_tokens,
            context_window: model.max_context_tokens,
        })
    }
}

/// Join the user's message and an attachment into one prompt.
///
/// ```
/// use relay_llm::extract::ExtractedFile;
/// use relay_llm::request::compose_message;
///
/// let file = ExtractedFile::new("notes.txt", "remember the milk");
/// let full = compose_message("Summarize this", Some(&file));
/// assert_eq!(
///     full,
///     "Summarize this\n\n---\nAttached file: notes.txt\n\nremember the milk"
/// );
/// assert_eq!(compose_message("Hi", None), "Hi");
/// ```
pub fn compose_message(message: &str, attachment: Option<&ExtractedFile>) -> String {
    match attachment {
        Some(file) => format!(
            "{}{}Attached file: {}\n\n{}",
            message, ATTACHMENT_SEPARATOR, file.file_name, file.text
        ),
        None => message.to_string(),
    }
}
