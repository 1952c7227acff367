//! Relay LLM - token-budgeted chat completions
//!
//! Forwards user text, optionally with the text of an attached file, to a
//! chat-completions endpoint. The model and output budget are chosen per
//! call: the request goes to the smallest registered model whose context
//! window holds the estimated input plus the desired output.
//!
//! # Flow
//!
//! ```text
//! AiClient::send_message(message, options, file?)
//!   ├─ ExtractorRegistry::extract(file)      (by extension)
//!   ├─ TokenEstimator::estimate(full message)
//!   ├─ ModelSelector::select_model(input + output)
//!   └─ POST /chat/completions  ──► choices[0].message.content
//! ```
//!
//! # Example
//!
//! ```ignore
//! use relay_llm::{AiClient, RequestOptions};
//!
//! let client = AiClient::new("sk-...", "openai")?;
//! let reply = client
//!     .send_message("Summarize this", &RequestOptions::default(), Some("report.pdf".as_ref()))
//!     .await?;
//! ```
//!
//! # See Also
//!
//! - [`crate::request`] for how the token budget is decided
//! - [`crate::extract`] for supported attachment formats

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod model_config;
pub mod providers;
pub mod registry;
pub mod request;
pub mod selector;
pub mod tokenizer;
pub mod traits;

pub use client::AiClient;
pub use config::ClientConfig;
pub use error::{LlmError, Result, RetryStrategy};
pub use extract::{ExtractedFile, ExtractorRegistry, TextExtractor};
pub use model_config::{ModelCatalog, ModelSpec};
pub use providers::{MockProvider, OpenAIProvider};
pub use registry::ProviderRegistry;
pub use request::{CompletionRequest, RequestBuilder, RequestOptions};
pub use selector::ModelSelector;
pub use tokenizer::{BpeEstimator, TokenEstimator, WordCountEstimator};
pub use traits::{ChatMessage, ChatProvider, ChatRole};
