//! Provider capability interface and chat message types.
//!
//! # WHY: Trait-Based Provider Abstraction
//!
//! [`ChatProvider`] is the seam between the provider-selection wrapper
//! ([`crate::AiClient`]) and concrete backends. New providers register a
//! constructor in [`crate::ProviderRegistry`]; the wrapper never changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::extract::ExtractedFile;
use crate::request::RequestOptions;

/// One message in the `messages` array of a chat-completions request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: ChatRole,

    /// Content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// What every completion provider can do.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Registry name of this provider (e.g. "openai").
    fn name(&self) -> &str;

    /// Send `message`, optionally with the text of an attached file, and
    /// return the first completion's text.
    async fn send_message(
        &self,
        message: &str,
        options: &RequestOptions,
        file_path: Option<&Path>,
    ) -> Result<String>;

    /// Extract the text of a file without contacting the provider.
    async fn process_file(&self, file_path: &Path) -> Result<ExtractedFile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_serializes_to_wire_shape() {
        let json = serde_json::to_value(ChatMessage::user("Hello, how are you?")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "user", "content": "Hello, how are you?"})
        );
    }

    #[test]
    fn test_role_as_str_matches_serde() {
        for role in [ChatRole::System, ChatRole::User, ChatRole::Assistant] {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, role.as_str());
        }
    }

    #[test]
    fn test_constructors() {
        assert_eq!(ChatMessage::system("s").role, ChatRole::System);
        assert_eq!(ChatMessage::assistant("a").role, ChatRole::Assistant);
    }
}
