//! Chat-model collaborator boundary.
//!
//! A chat request is a model identifier plus an ordered list of role/content
//! turns; the reply is the model's raw text. [`OllamaChat`] implements the
//! contract against an Ollama-compatible HTTP server; tests use
//! [`crate::MockChat`]. Transport and model errors (connection refused,
//! model not found, timeout) propagate as fatal — the harness never retries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Turn role: `system` or `user`.
    pub role: String,
    /// Turn text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The chat collaborator seam.
pub trait ChatBackend: Send + Sync {
    /// Send one conversation to `model` and return its text reply verbatim.
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Ollama-compatible chat client.
///
/// Posts to `<host>/api/chat` with streaming disabled and returns the
/// reply's message content.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    host: String,
}

/// Default Ollama server address.
pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";

impl Default for OllamaChat {
    fn default() -> Self {
        OllamaChat::new(DEFAULT_OLLAMA_HOST)
    }
}

impl OllamaChat {
    /// Create a client for the given host, e.g. `http://127.0.0.1:11434`.
    pub fn new(host: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        OllamaChat { host }
    }

    /// The server address this client talks to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ChatBackend for OllamaChat {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };

        let response = ureq::post(&url)
            .send_json(&request)
            .map_err(|e| Error::chat(format!("POST {} failed: {}", url, e)))?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| Error::chat(format!("malformed chat response: {}", e)))?;

        Ok(parsed.message.content)
    }
}

// =============================================================================
// Tests
// =============================================================================
