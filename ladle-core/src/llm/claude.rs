//! Claude (Anthropic) messages provider.

use super::{non_empty, send_for_body, CompletionRequest, LlmError, LlmProvider, REDACTED};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ClaudeProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client,
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
            api_key,
            model,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
    error: ClaudeApiError,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiError {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ClaudeErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

fn parse_response(body: &str) -> Result<String, LlmError> {
    let response: ClaudeResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    let text = response
        .content
        .into_iter()
        .find_map(|c| (c.content_type == "text").then_some(c.text).flatten())
        .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))?;
    non_empty(text)
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        // No JSON mode on this API; the prompt alone asks for a bare object.
        let body = ClaudeRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            temperature: request.temperature,
            messages: vec![ClaudeMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let http = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let body = send_for_body(http, error_message).await?;
        parse_response(&body)
    }

    fn provider_name(&self) -> &'static str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
