//! Text-understanding capability.
//!
//! The pipeline never parses free text with a model itself; it hands a
//! `CapabilityRequest` to a `TextCapability` and receives raw response text.
//! `LlmClient` is the production implementation (Anthropic, OpenAI-compatible
//! or Ollama backends). Tests substitute a deterministic stub.

mod client;
pub mod json_span;

use async_trait::async_trait;
use thiserror::Error;

pub use client::prompts;
pub use client::{LlmAppConfig, LlmClient, LlmConfig, LlmDeviceConfig, LlmProvider};

/// What a capability request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTask {
    /// Category/subcategory/strain-type labels for a batch of rows.
    Classify,
    /// Labeled-section decomposition of free-text descriptions.
    Extract,
}

impl CapabilityTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityTask::Classify => "classify",
            CapabilityTask::Extract => "extract",
        }
    }
}

/// A single round trip to the text capability.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub task: CapabilityTask,
    /// Full natural-language instruction, including the JSON contract.
    pub prompt: String,
    /// Number of array elements the response must contain.
    pub expected_items: usize,
    /// Upper bound on response tokens.
    pub max_tokens: u32,
}

/// Errors that can occur during capability calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to the backend
    #[error("Connection error: {0}")]
    Connection(String),
    /// Backend returned an error status
    #[error("API error: {0}")]
    Api(String),
    /// Backend response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
    /// Provider needs credentials that are not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
    /// Capability disabled in configuration
    #[error("LLM is disabled")]
    Disabled,
}

/// A backend that turns an instruction into response text.
#[async_trait]
pub trait TextCapability: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Issue one blocking round trip and return the raw response text.
    async fn complete(&self, request: &CapabilityRequest) -> Result<String, LlmError>;
}

/// Truncate text to at most `max_chars` bytes on a UTF-8 boundary.
pub fn truncate_content(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
