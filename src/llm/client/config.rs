//! Text capability client configuration.
//!
//! Split into two tiers:
//! - `LlmAppConfig`: From the config file (generation params, enable switch)
//! - `LlmDeviceConfig`: From env vars, machine-specific (provider, endpoint, model, api_key)
//!
//! Env vars: NASHA_LLM_PROVIDER, NASHA_LLM_MODEL, NASHA_LLM_ENDPOINT, NASHA_LLM_API_KEY
//! (generic LLM_* names also accepted as fallback)

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
    /// Ollama API (local, default when no key is configured)
    #[default]
    Ollama,
}

impl prefer::FromValue for LlmProvider {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(s) => LlmProvider::from_str(s).ok_or_else(|| prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: format!("unknown provider: {}", s).into(),
            }),
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Whether requests to this provider need an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

/// Application-level config: what the capability is asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmAppConfig {
    /// Whether the text capability may be called at all
    #[serde(default = "default_enabled")]
    #[prefer(default)]
    pub enabled: bool,
    /// Maximum tokens in a classification response
    #[serde(default = "default_max_tokens")]
    #[prefer(default)]
    pub max_tokens: u32,
    /// Maximum tokens in an extraction response
    #[serde(default = "default_extract_max_tokens")]
    #[prefer(default)]
    pub extract_max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    #[prefer(default)]
    pub temperature: f32,
    /// Maximum characters of a single cell value embedded in a prompt
    #[serde(default = "default_max_content_chars")]
    #[prefer(default)]
    pub max_content_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[prefer(default)]
    pub timeout_secs: u64,
}

/// Device-level config (from env vars): how to reach the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDeviceConfig {
    pub provider: LlmProvider,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Combined runtime configuration.
///
/// Serde: only the app config is (de)serialized. Device config is
/// populated from environment variables during Default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmConfig {
    #[serde(flatten)]
    #[prefer(flatten)]
    pub app: LlmAppConfig,
    #[serde(skip)]
    #[prefer(skip)]
    pub device: LlmDeviceConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_extract_max_tokens() -> u32 {
    1500
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_content_chars() -> usize {
    4000
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_tokens: default_max_tokens(),
            extract_max_tokens: default_extract_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmAppConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for LlmDeviceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Provider defaults applied when a provider is chosen without endpoint/model.
fn provider_defaults(name: &str) -> Option<(LlmProvider, &'static str, &'static str)> {
    match name {
        "anthropic" | "claude" => Some((
            LlmProvider::Anthropic,
            "https://api.anthropic.com",
            "claude-sonnet-4-20250514",
        )),
        "openai" => Some((LlmProvider::OpenAI, "https://api.openai.com", "gpt-4o-mini")),
        "groq" => Some((
            LlmProvider::OpenAI,
            "https://api.groq.com/openai",
            "llama-3.3-70b-versatile",
        )),
        "together" => Some((
            LlmProvider::OpenAI,
            "https://api.together.xyz",
            "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
        )),
        _ => None,
    }
}

/// Provider-specific key variables, in auto-detection order.
const PROVIDER_KEY_VARS: &[(&str, &str)] = &[
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("groq", "GROQ_API_KEY"),
];

impl LlmDeviceConfig {
    /// Create device config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve device config through an arbitrary variable lookup.
    ///
    /// Env vars (NASHA_LLM_* preferred, LLM_* accepted as fallback):
    /// - PROVIDER: anthropic, openai, groq, together, ollama
    /// - MODEL, ENDPOINT, API_KEY
    ///
    /// Without an explicit provider, the first of ANTHROPIC_API_KEY,
    /// OPENAI_API_KEY, GROQ_API_KEY that is set selects the provider;
    /// otherwise Ollama at OLLAMA_HOST or localhost.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, fallback: &str| lookup(primary).or_else(|| lookup(fallback));

        let explicit_provider = var("NASHA_LLM_PROVIDER", "LLM_PROVIDER").map(|p| p.to_lowercase());
        let explicit_endpoint = var("NASHA_LLM_ENDPOINT", "LLM_ENDPOINT");
        let explicit_model = var("NASHA_LLM_MODEL", "LLM_MODEL");
        let explicit_key = var("NASHA_LLM_API_KEY", "LLM_API_KEY");

        let mut config = Self {
            provider: LlmProvider::Ollama,
            endpoint: lookup("OLLAMA_HOST").unwrap_or_else(default_endpoint),
            model: default_model(),
            api_key: explicit_key,
        };

        // Explicit provider wins, otherwise the first provider key found
        let chosen = explicit_provider.or_else(|| {
            PROVIDER_KEY_VARS
                .iter()
                .find(|(_, env_var)| lookup(env_var).is_some())
                .map(|(name, _)| name.to_string())
        });

        if let Some(name) = chosen {
            if let Some((provider, endpoint, model)) = provider_defaults(&name) {
                config.provider = provider;
                config.endpoint = endpoint.to_string();
                config.model = model.to_string();
            } else if let Some(provider) = LlmProvider::from_str(&name) {
                config.provider = provider;
            }

            if config.api_key.is_none() {
                config.api_key = PROVIDER_KEY_VARS
                    .iter()
                    .find(|(provider_name, _)| *provider_name == name)
                    .and_then(|(_, env_var)| lookup(env_var));
            }
        }

        if let Some(endpoint) = explicit_endpoint {
            config.endpoint = endpoint;
        }
        if let Some(model) = explicit_model {
            config.model = model;
        }

        config
    }

    /// Provider name for display.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::Ollama => "Ollama",
            LlmProvider::OpenAI => {
                if self.endpoint.contains("groq.com") {
                    "Groq"
                } else if self.endpoint.contains("together.xyz") {
                    "Together.ai"
                } else {
                    "OpenAI"
                }
            }
        }
    }

    /// Provider-aware hint for error messages.
    pub fn availability_hint(&self) -> String {
        match self.provider {
            LlmProvider::Ollama => format!(
                "Ollama not available at {}. Make sure Ollama is running: ollama serve",
                self.endpoint
            ),
            LlmProvider::Anthropic if self.api_key.is_none() => {
                "Anthropic API key not set. Set ANTHROPIC_API_KEY or NASHA_LLM_API_KEY".to_string()
            }
            LlmProvider::OpenAI if self.api_key.is_none() => {
                "OpenAI API key not set. Set OPENAI_API_KEY or NASHA_LLM_API_KEY".to_string()
            }
            _ => format!("{} API not available at {}", self.provider_name(), self.endpoint),
        }
    }
}

impl LlmConfig {
    pub fn new(app: LlmAppConfig, device: LlmDeviceConfig) -> Self {
        Self { app, device }
    }

    pub fn is_default(&self) -> bool {
        self.app.is_default()
    }

    pub fn enabled(&self) -> bool {
        self.app.enabled
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.device.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.device.endpoint
    }

    pub fn model(&self) -> &str {
        &self.device.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.device.api_key.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.app.temperature
    }

    pub fn max_content_chars(&self) -> usize {
        self.app.max_content_chars
    }

    pub fn provider_name(&self) -> &'static str {
        self.device.provider_name()
    }

    pub fn availability_hint(&self) -> String {
        self.device.availability_hint()
    }

    // Setters for CLI override use cases

    pub fn set_endpoint(&mut self, endpoint: String) {
        self.device.endpoint = endpoint;
    }

    pub fn set_model(&mut self, model: String) {
        self.device.model = model;
    }
}
