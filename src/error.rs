//! Error types for the relay client, with advisory retry strategies.
//!
//! # Error Handling Philosophy
//!
//! Every failure reaches the immediate caller as one [`LlmError`] with a
//! human-readable message. Nothing is swallowed and nothing is retried inside
//! the crate; [`LlmError::retry_strategy`] only tells the caller what a retry
//! layer could reasonably do.
//!
//! # Common Errors and Solutions
//!
//! | Error | Raised | Solution |
//! |-------|--------|----------|
//! | `MissingApiKey` | client construction | Set `OPENAI_API_KEY` |
//! | `UnsupportedProvider` | client construction | Use a registered provider name |
//! | `UnsupportedFileType` | file extraction | Convert the file or register an extractor |
//! | `TokenLimitExceeded` | request building | Shorten the message or attachment |
//! | `CompletionFailed` | HTTP call | Inspect the upstream message |
//! | `MalformedResponse` | response parsing | Check the endpoint speaks the chat-completions format |

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, LlmError>;

// ============================================================================
// Retry Strategy
// ============================================================================

/// What a caller-side retry layer could do with a failed call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff (transient upstream failures).
    ExponentialBackoff {
        /// Initial delay before first retry.
        base_delay: Duration,
        /// Maximum delay between retries.
        max_delay: Duration,
        /// Maximum number of retry attempts.
        max_attempts: u32,
    },

    /// Do not retry as-is; the caller should shrink the input first.
    ReduceContext,

    /// Do not retry at all (permanent error).
    NoRetry,
}

impl RetryStrategy {
    /// Standard backoff for upstream/transport failures.
    pub fn upstream_backoff() -> Self {
        Self::ExponentialBackoff {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 3,
        }
    }

    /// Check if this strategy allows retrying.
    pub fn should_retry(&self) -> bool {
        !matches!(self, Self::NoRetry)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while building or sending a completion request.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The client was constructed without an API key.
    #[error("API key is required to initialize the client")]
    MissingApiKey,

    /// The requested provider is not registered.
    #[error("Provider '{0}' not supported")]
    UnsupportedProvider(String),

    /// No extractor is registered for the file's extension.
    #[error("Unsupported file type: '{0}'")]
    UnsupportedFileType(String),

    /// No registered model can hold input plus desired output.
    #[error("Token limit exceeded: required {required}, largest available {max}")]
    TokenLimitExceeded { required: usize, max: usize },

    /// The upstream call failed (non-2xx status or transport error).
    #[error("Failed to get completion: {0}")]
    CompletionFailed(String),

    /// The upstream answered 2xx but the body has an unexpected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request options are out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The attached file could not be read.
    #[error("Failed to read '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An extraction collaborator rejected the file contents.
    #[error("Failed to extract text from '{extension}' file: {reason}")]
    ExtractionFailed { extension: String, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::CompletionFailed("request timed out".to_string())
        } else if err.is_connect() {
            LlmError::CompletionFailed(format!("connection failed: {}", err))
        } else {
            LlmError::CompletionFailed(err.to_string())
        }
    }
}

impl LlmError {
    /// Build an [`LlmError::ExtractionFailed`] from any displayable cause.
    pub fn extraction(extension: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExtractionFailed {
            extension: extension.into(),
            reason: reason.to_string(),
        }
    }

    /// Get the advisory retry strategy for this error.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_llm::{LlmError, RetryStrategy};
    ///
    /// let error = LlmError::CompletionFailed("503 Service Unavailable".to_string());
    /// assert!(error.retry_strategy().should_retry());
    ///
    /// let error = LlmError::MissingApiKey;
    /// assert_eq!(error.retry_strategy(), RetryStrategy::NoRetry);
    /// ```
    pub fn retry_strategy(&self) -> RetryStrategy {
        match self {
            Self::CompletionFailed(_) => RetryStrategy::upstream_backoff(),
            Self::TokenLimitExceeded { .. } => RetryStrategy::ReduceContext,
            Self::MissingApiKey
            | Self::UnsupportedProvider(_)
            | Self::UnsupportedFileType(_)
            | Self::MalformedResponse(_)
            | Self::InvalidRequest(_)
            | Self::FileRead { .. }
            | Self::ExtractionFailed { .. }
            | Self::ConfigError(_) => RetryStrategy::NoRetry,
        }
    }

    /// Get a user-friendly description of the error with a suggested action.
    ///
    /// ```
    /// use relay_llm::LlmError;
    ///
    /// let error = LlmError::MissingApiKey;
    /// assert!(error.user_description().contains("OPENAI_API_KEY"));
    /// ```
    pub fn user_description(&self) -> String {
        match self {
            Self::MissingApiKey => {
                "No API key configured. Set OPENAI_API_KEY or pass a key explicitly.".to_string()
            }
            Self::UnsupportedProvider(name) => {
                format!("Provider '{}' is not available. Use 'openai'.", name)
            }
            Self::UnsupportedFileType(ext) => format!(
                "Files with extension '{}' cannot be attached. Supported: .txt, .csv, .docx, .pdf, .png, .jpg, .jpeg, .bmp.",
                ext
            ),
            Self::TokenLimitExceeded { required, max } => format!(
                "Request needs {} tokens but the largest model holds {}. Shorten the input or lower max_tokens.",
                required, max
            ),
            Self::CompletionFailed(msg) => format!("The completion service failed: {}", msg),
            Self::MalformedResponse(_) => {
                "The completion service returned an unexpected response.".to_string()
            }
            Self::InvalidRequest(msg) => format!("Invalid request: {}. Check your options.", msg),
            Self::FileRead { path, .. } => {
                format!("Could not read '{}'. Check the path and permissions.", path.display())
            }
            Self::ExtractionFailed { extension, .. } => {
                format!("The '{}' file could not be parsed. Is it corrupt?", extension)
            }
            Self::ConfigError(msg) => format!("Configuration error: {}.", msg),
        }
    }

    /// Check if this error is recoverable (can be retried).
    pub fn is_recoverable(&self) -> bool {
        self.retry_strategy().should_retry()
    }
}
