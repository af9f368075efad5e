//! LLM provider abstraction for recipe extraction.
//!
//! Providers turn a [`CompletionRequest`] into the model's raw text answer. They know
//! nothing about recipes; schema handling lives in [`crate::extract`].

mod claude;
mod config;
mod fake;
mod gemini;
mod openai;

pub use claude::ClaudeProvider;
pub use config::{ConfigError, LlmConfig, ProviderKind};
pub use fake::FakeProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// One prompt to send to a model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Ask for a bare JSON object on providers that support a JSON response mode.
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 4096,
            temperature: None,
            json_response: false,
        }
    }
}

/// A chat-style model endpoint.
///
/// Implementations are stateless apart from their HTTP client and safe to share.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send the request and return the model's text answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Provider name, e.g. "openai" or "ollama".
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Canned answer served by the `fake` provider, so the service runs end to end offline.
const SAMPLE_RECIPE_JSON: &str = r#"{
  "name": "Sample Tomato Soup",
  "ingredients": ["4 ripe tomatoes", "1 onion", "2 cups vegetable stock", "salt"],
  "instructions": ["Chop the tomatoes and onion.", "Simmer everything in the stock for 20 minutes.", "Blend and season with salt."],
  "image_url": null
}"#;

/// Build the provider selected by `config`.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| LlmError::NotConfigured(format!("HTTP client: {e}")))?;
    let api_key = || {
        config.api_key.clone().ok_or_else(|| {
            LlmError::NotConfigured(format!("{} requires an API key", config.provider.as_str()))
        })
    };

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            client,
            "openai",
            &config.base_url,
            Some(api_key()?),
            config.model.clone(),
        )),
        ProviderKind::Ollama => Arc::new(OpenAiProvider::new(
            client,
            "ollama",
            &config.base_url,
            config.api_key.clone(),
            config.model.clone(),
        )),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            client,
            &config.base_url,
            api_key()?,
            config.model.clone(),
        )),
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(
            client,
            &config.base_url,
            api_key()?,
            config.model.clone(),
        )),
        ProviderKind::Fake => Arc::new(FakeProvider::new().with_default_response(SAMPLE_RECIPE_JSON)),
    };
    Ok(provider)
}

/// Seconds from a `Retry-After` header, when present and numeric.
fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Send a prepared request and return the successful body, mapping transport and
/// status failures the same way for every provider.
async fn send_for_body(
    request: reqwest::RequestBuilder,
    error_message: fn(&str) -> Option<String>,
) -> Result<String, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    let status = response.status().as_u16();
    if status == 429 {
        return Err(LlmError::RateLimited {
            retry_after_secs: retry_after(&response),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    if !(200..300).contains(&status) {
        let message = error_message(&body).unwrap_or(body);
        return Err(LlmError::ApiError { status, message });
    }
    Ok(body)
}

/// Trim a model answer and reject empty ones.
/// Stand-in for secrets in `Debug` output.
const REDACTED: &str = "<redacted>";

fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::ParseError("Model returned an empty answer".to_string()))
    } else {
        Ok(text)
    }
}
