//! LLM client backing the text capability.
//!
//! Supports the Anthropic Messages API, OpenAI-compatible chat completions
//! (OpenAI, Groq, Together.ai) and Ollama for local inference.

mod config;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use config::{LlmAppConfig, LlmConfig, LlmDeviceConfig, LlmProvider};

use super::{CapabilityRequest, LlmError, TextCapability};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// LLM client for catalog processing.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body shared by Anthropic Messages and OpenAI chat completions.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.app.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Fail fast when the capability cannot be used at all.
    pub fn ensure_ready(&self) -> Result<(), LlmError> {
        if !self.config.enabled() {
            return Err(LlmError::Disabled);
        }
        if self.config.provider().requires_api_key() && self.config.api_key().is_none() {
            return Err(LlmError::MissingCredentials(
                self.config.availability_hint(),
            ));
        }
        Ok(())
    }

    /// Check if the backend answers its model listing endpoint.
    pub async fn is_available(&self) -> bool {
        if self.ensure_ready().is_err() {
            return false;
        }
        let request = match self.config.provider() {
            LlmProvider::Ollama => self.client.get(self.url("/api/tags")),
            LlmProvider::OpenAI => self.authorize(self.client.get(self.url("/v1/models"))),
            LlmProvider::Anthropic => self.authorize(self.client.get(self.url("/v1/models"))),
        };
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Send a prompt to the configured provider.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.ensure_ready()?;
        debug!(
            "Calling {} model {} ({} prompt bytes)",
            self.config.provider_name(),
            self.config.model(),
            prompt.len()
        );
        match self.config.provider() {
            LlmProvider::Anthropic => self.call_anthropic(prompt, max_tokens).await,
            LlmProvider::OpenAI => self.call_openai(prompt, max_tokens).await,
            LlmProvider::Ollama => self.call_ollama(prompt, max_tokens).await,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint().trim_end_matches('/'), path)
    }

    /// Attach provider-specific credentials.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(key) = self.config.api_key() else {
            return request;
        };
        match self.config.provider() {
            LlmProvider::Anthropic => request
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            _ => request.bearer_auth(key),
        }
    }

    fn chat_request<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> ChatRequest<'a> {
        ChatRequest {
            model: self.config.model(),
            max_tokens,
            temperature: self.config.temperature(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }

    async fn call_anthropic(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let body = self.chat_request(prompt, max_tokens);
        let resp = self
            .post_json(self.authorize(self.client.post(self.url("/v1/messages"))), &body)
            .await?;

        let parsed: AnthropicResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text)
            .collect();
        Ok(text)
    }

    async fn call_openai(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let body = self.chat_request(prompt, max_tokens);
        let resp = self
            .post_json(
                self.authorize(self.client.post(self.url("/v1/chat/completions"))),
                &body,
            )
            .await?;

        let parsed: OpenAiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("Response contained no choices".to_string()))
    }

    async fn call_ollama(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let body = OllamaRequest {
            model: self.config.model(),
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature(),
                num_predict: max_tokens,
            },
        };
        let resp = self
            .post_json(self.client.post(self.url("/api/generate")), &body)
            .await?;

        let parsed: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(parsed.response)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        body: &T,
    ) -> Result<reqwest::Response, LlmError> {
        let resp = request
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }
        Ok(resp)
    }
}

#[async_trait]
impl TextCapability for LlmClient {
    fn name(&self) -> &str {
        self.config.provider_name()
    }

    async fn complete(&self, request: &CapabilityRequest) -> Result<String, LlmError> {
        debug!(
            "{} request expecting {} items",
            request.task.as_str(),
            request.expected_items
        );
        self.generate(&request.prompt, request.max_tokens).await
    }
}
