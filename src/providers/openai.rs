//! OpenAI chat-completions provider.
//!
//! One call is one POST to `<base_url>/chat/completions` with bearer-token
//! authorization. The model and output budget come from the
//! [`RequestBuilder`]; this module only moves bytes and unwraps answers.
//!
//! # Failure mapping
//!
//! | situation | error |
//! |-----------|-------|
//! | connect/timeout/body read failure | `CompletionFailed` |
//! | non-2xx status | `CompletionFailed` with the upstream `error.message` |
//! | 2xx without `choices[0].message.content` | `MalformedResponse` |

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{mask_api_key, ClientConfig};
use crate::error::{LlmError, Result};
use crate::extract::{extension_of, ExtractedFile, ExtractorRegistry};
use crate::request::{CompletionRequest, RequestBuilder, RequestOptions};
use crate::tokenizer::TokenEstimator;
use crate::traits::ChatProvider;

/// Registry name of this provider.
pub const PROVIDER_NAME: &str = "openai";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Error response from API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// One server-sent event of a streamed completion.
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    index: usize,
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Provider
// ============================================================================

/// Completion client for the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    config: ClientConfig,
    builder: RequestBuilder,
    extractors: Arc<ExtractorRegistry>,
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("api_key", &mask_api_key(&self.config.api_key))
            .field("base_url", &self.config.base_url)
            .field("builder", &self.builder)
            .field("extractors", &self.extractors)
            .finish()
    }
}

impl OpenAIProvider {
    /// Provider with default settings for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Provider from a full config. Fails with `MissingApiKey` on an empty key.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Self::build_client(&config)?;
        let builder = RequestBuilder::new(&config.models)?
            .with_default_output_tokens(config.default_output_tokens);

        debug!(
            base_url = %config.base_url,
            api_key = %mask_api_key(&config.api_key),
            models = config.models.models.len(),
            "Created OpenAI provider"
        );

        Ok(Self {
            client,
            config,
            builder,
            extractors: Arc::new(ExtractorRegistry::new()),
        })
    }

    fn build_client(config: &ClientConfig) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to build HTTP client: {}", e)))
    }

    /// Use a caller-built HTTP client (for deadlines, proxies, pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Replace the extractor registry used for attachments.
    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Arc::new(extractors);
        self
    }

    /// Replace the token estimator used for budgeting.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.builder = self.builder.with_estimator(estimator);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the request `send_message` would send, without sending it.
    pub fn build_request(
        &self,
        message: &str,
        options: &RequestOptions,
        attachment: Option<&ExtractedFile>,
    ) -> Result<CompletionRequest> {
        self.builder.build(message, options, attachment)
    }

    /// POST a built request and return the first completion's text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self.config.chat_completions_url();

        debug!(
            url = %url,
            model = %request.model,
            max_tokens = request.max_tokens,
            stream = request.stream,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Network error calling OpenAI API");
                LlmError::from(e)
            })?;

        let status = response.status();
        debug!(status = %status, "OpenAI API response");

        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            LlmError::from(e)
        })?;

        if !status.is_success() {
            warn!(status = %status, body = %preview(&body), "OpenAI API error");
            return Err(LlmError::CompletionFailed(upstream_error_message(
                status, &body,
            )));
        }

        if request.stream {
            parse_stream_body(&body)
        } else {
            parse_completion_body(&body)
        }
    }

    async fn extract_file(&self, file_path: &Path) -> Result<ExtractedFile> {
        let registry = self.extractors.clone();
        let path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || registry.extract(&path))
            .await
            .map_err(|e| LlmError::extraction(extension_of(file_path), e))?
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn send_message(
        &self,
        message: &str,
        options: &RequestOptions,
        file_path: Option<&Path>,
    ) -> Result<String> {
        let attachment = match file_path {
            Some(path) => Some(self.extract_file(path).await?),
            None => None,
        };
        let request = self.build_request(message, options, attachment.as_ref())?;
        self.complete(&request).await
    }

    async fn process_file(&self, file_path: &Path) -> Result<ExtractedFile> {
        self.extract_file(file_path).await
    }
}

// ============================================================================
// Body parsing
// ============================================================================

fn upstream_error_message(status: StatusCode, body: &str) -> String {
    let detail = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_resp) => error_resp.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        Err(_) => preview(body).to_string(),
    };
    format!("OpenAI API error {}: {}", status.as_u16(), detail)
}

fn parse_completion_body(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, body = %preview(body), "Failed to parse OpenAI response");
        LlmError::MalformedResponse(format!("{} | body preview: {}", e, preview(body)))
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("No choices in response".to_string()))?;

    choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| LlmError::MalformedResponse("No message content in choice".to_string()))
}

/// Join the `delta.content` of choice 0 across `data:` events.
fn parse_stream_body(body: &str) -> Result<String> {
    let mut content = String::new();
    let mut chunks = 0usize;

    for line in body.lines() {
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        let chunk: ChatStreamChunk = serde_json::from_str(data).map_err(|e| {
            LlmError::MalformedResponse(format!("invalid stream chunk: {} | {}", e, preview(data)))
        })?;
        chunks += 1;
        for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
            if let Some(text) = choice.delta.and_then(|d| d.content) {
                content.push_str(&text);
            }
        }
    }

    if chunks == 0 {
        return Err(LlmError::MalformedResponse(
            "stream contained no completion chunks".to_string(),
        ));
    }
    Ok(content)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_config::{ModelCatalog, ModelSpec};

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            OpenAIProvider::new(""),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_debug_masks_key() {
        let provider = OpenAIProvider::new("sk-secret-key-123456").unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-secret-key-123456"));
        assert!(debug.contains("sk-sec***"));
    }

    #[test]
    fn test_build_request_uses_catalog() {
        let config = ClientConfig::new("k").with_models(
            ModelCatalog::new(vec![ModelSpec::new("mini", 1010), ModelSpec::new("maxi", 9000)])
                .unwrap(),
        );
        let provider = OpenAIProvider::from_config(config).unwrap();
        let opts = RequestOptions::default();
        assert_eq!(
            provider.build_request("one two three", &opts, None).unwrap().model,
            "mini"
        );
        let long = vec!["w"; 20].join(" ");
        assert_eq!(provider.build_request(&long, &opts, None).unwrap().model, "maxi");
    }

    #[test]
    fn test_parse_completion_body() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"I'm fine"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), "I'm fine");
    }

    #[test]
    fn test_parse_completion_body_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), "first");
    }

    #[test]
    fn test_parse_malformed_bodies() {
        for body in [
            "not json",
            r#"{"object":"list"}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{"finish_reason":"stop"}]}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        ] {
            assert!(
                matches!(parse_completion_body(body), Err(LlmError::MalformedResponse(_))),
                "body should be malformed: {}",
                body
            );
        }
    }

    #[test]
    fn test_upstream_error_message_openai_shape() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let msg = upstream_error_message(StatusCode::UNAUTHORIZED, body);
        assert_eq!(msg, "OpenAI API error 401: Incorrect API key provided");
    }

    #[test]
    fn test_upstream_error_message_raw_body() {
        let msg = upstream_error_message(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(msg, "OpenAI API error 502: upstream exploded");
    }

    #[test]
    fn test_upstream_error_message_empty_body() {
        let msg = upstream_error_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(msg, "OpenAI API error 503: Service Unavailable");
    }

    #[test]
    fn test_parse_stream_body() {
        let body = "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"I'm\"}}]}\n\n\
                    data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" fine\"}}]}\n\n\
                    data: [DONE]\n\n";
        assert_eq!(parse_stream_body(body).unwrap(), "I'm fine");
    }

    #[test]
    fn test_parse_stream_body_ignores_other_choices() {
        let body = "data: {\"choices\":[{\"index\":1,\"delta\":{\"content\":\"B\"}},{\"index\":0,\"delta\":{\"content\":\"A\"}}]}\n\ndata: [DONE]\n";
        assert_eq!(parse_stream_body(body).unwrap(), "A");
    }

    #[test]
    fn test_parse_stream_body_malformed() {
        assert!(matches!(
            parse_stream_body("{\"choices\":[]}"),
            Err(LlmError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_stream_body("data: {broken\n"),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        assert_eq!(preview(&long).chars().count(), 500);
        assert_eq!(preview("short"), "short");
    }
}
