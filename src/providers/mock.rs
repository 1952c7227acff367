//! Mock provider for testing.
//!
//! Runs the real extraction and request-building path but answers from a
//! queue instead of the network, and records every request it would have
//! sent.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::extract::{ExtractedFile, ExtractorRegistry};
use crate::model_config::ModelCatalog;
use crate::request::{CompletionRequest, RequestBuilder, RequestOptions};
use crate::traits::ChatProvider;

/// Answer returned when the queue is empty.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// Mock completion provider.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    builder: RequestBuilder,
    extractors: Arc<ExtractorRegistry>,
}

impl MockProvider {
    /// Mock over the built-in model catalog.
    pub fn new() -> Self {
        let builder = RequestBuilder::new(&ModelCatalog::builtin_defaults())
            .expect("built-in catalog is valid");
        Self::with_builder(builder)
    }

    /// Mock honoring a client config's catalog and output budget.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let builder = RequestBuilder::new(&config.models)?
            .with_default_output_tokens(config.default_output_tokens);
        Ok(Self::with_builder(builder))
    }

    fn with_builder(builder: RequestBuilder) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            builder,
            extractors: Arc::new(ExtractorRegistry::new()),
        }
    }

    /// Add a response to the queue.
    pub async fn add_response(&self, response: impl Into<String>) {
        self.responses.lock().await.push(response.into());
    }

    /// Requests built so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_message(
        &self,
        message: &str,
        options: &RequestOptions,
        file_path: Option<&Path>,
    ) -> Result<String> {
        let attachment = match file_path {
            Some(path) => Some(self.process_file(path).await?),
            None => None,
        };
        let request = self.builder.build(message, options, attachment.as_ref())?;
        self.requests.lock().await.push(request);

        let mut responses = self.responses.lock().await;
        Ok(if responses.is_empty() {
            DEFAULT_MOCK_RESPONSE.to_string()
        } else {
            responses.remove(0)
        })
    }

    async fn process_file(&self, file_path: &Path) -> Result<ExtractedFile> {
        self.extractors.extract(file_path)
    }
}
