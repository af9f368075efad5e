//! OpenAI chat-completions provider. Ollama serves the same wire format under `/v1`.

use super::{non_empty, send_for_body, CompletionRequest, LlmError, LlmProvider, REDACTED};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub struct OpenAiProvider {
    client: reqwest::Client,
    label: &'static str,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    /// `label` is reported as the provider name, so one type can stand for several
    /// OpenAI-compatible backends.
    pub fn new(
        client: reqwest::Client,
        label: &'static str,
        base_url: &str,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            client,
            label,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        }
    }
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("label", &self.label)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

fn parse_response(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::ParseError("No message content in response".to_string()))?;
    non_empty(text)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_response.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let body = send_for_body(http, error_message).await?;
        parse_response(&body)
    }

    fn provider_name(&self) -> &'static str {
        self.label
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_api_key() {
        let provider = OpenAiProvider::new(
            reqwest::Client::new(),
            "openai",
            "https://api.openai.test/v1",
            Some("sk-secret".to_string()),
            "gpt-4o-mini".to_string(),
        );
        let printed = format!("{provider:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("gpt-4o-mini"));
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"name\":\"Soup\"}"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), r#"{"name":"Soup"}"#);
    }

    #[test]
    fn missing_content_is_a_parse_error() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(parse_response(body), Err(LlmError::ParseError(_))));
        assert!(matches!(parse_response(r#"{"choices":[]}"#), Err(LlmError::ParseError(_))));
        assert!(matches!(parse_response("<html>"), Err(LlmError::ParseError(_))));
    }

    #[test]
    fn reads_error_envelope() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Incorrect API key provided"));
        assert_eq!(error_message("upstream timeout"), None);
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let provider = OpenAiProvider::new(
            reqwest::Client::new(),
            "ollama",
            "http://localhost:11434/v1/",
            None,
            "llama3.1".to_string(),
        );
        assert_eq!(provider.endpoint, "http://localhost:11434/v1/chat/completions");
        assert_eq!(provider.provider_name(), "ollama");
    }
}
