//! Model provider configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::extract::DEFAULT_MAX_ATTEMPTS;

/// Default whole-request timeout for model calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
    Gemini,
    Claude,
    Fake,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
            ProviderKind::Fake => "fake",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "llama3.1",
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Claude => "claude-3-5-sonnet-20241022",
            ProviderKind::Fake => "fake-model",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Claude => "https://api.anthropic.com/v1",
            ProviderKind::Fake => "",
        }
    }

    /// Environment variable holding this provider's API key, if it takes one.
    fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Claude => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama | ProviderKind::Fake => None,
        }
    }

    /// Environment variable overriding this provider's base URL, if any.
    fn base_url_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_BASE_URL"),
            ProviderKind::Ollama => Some("OLLAMA_BASE_URL"),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            "gemini" => Ok(ProviderKind::Gemini),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "fake" => Ok(ProviderKind::Fake),
            _ => Err(ConfigError::InvalidValue {
                key: "LADLE_LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Extraction model configuration.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Required for the hosted providers, optional for Ollama.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    /// Model calls per extraction, counting the first one.
    pub max_attempts: u32,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| super::REDACTED))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `LADLE_LLM_PROVIDER`: "openai" | "ollama" | "gemini" | "claude" | "fake" (default "ollama")
    /// - `LADLE_LLM_MODEL`: model name (provider-specific default)
    /// - `OPENAI_API_KEY`, `GEMINI_API_KEY`, `ANTHROPIC_API_KEY`: required by the matching provider
    /// - `OPENAI_BASE_URL`, `OLLAMA_BASE_URL`: endpoint overrides
    /// - `LADLE_LLM_TIMEOUT_SECS`: per-call timeout (default 120)
    /// - `LADLE_EXTRACT_MAX_ATTEMPTS`: model calls per extraction (default 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`LlmConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider = match lookup("LADLE_LLM_PROVIDER").filter(|v| !v.trim().is_empty()) {
            Some(value) => value.parse()?,
            None => ProviderKind::Ollama,
        };

        let model = lookup("LADLE_LLM_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = match provider.api_key_var() {
            Some(var) => Some(
                lookup(var)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))?,
            ),
            // Ollama behind an authenticating proxy can still take a key.
            None if provider == ProviderKind::Ollama => lookup("OLLAMA_API_KEY"),
            None => None,
        };

        let base_url = provider
            .base_url_var()
            .and_then(&lookup)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let timeout_secs = parse_or(&lookup, "LADLE_LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_attempts = parse_or(&lookup, "LADLE_EXTRACT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "LADLE_EXTRACT_MAX_ATTEMPTS".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            provider,
            model,
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
