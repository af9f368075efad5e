//! Google Gemini `generateContent` provider.

use super::{non_empty, send_for_body, CompletionRequest, LlmError, LlmProvider, REDACTED};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
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

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, LlmError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| LlmError::ParseError("No candidates in response".to_string()))?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    non_empty(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = GenerateRequest {
            system_instruction: request.system.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                response_mime_type: request.json_response.then_some("application/json"),
            },
        };

        let http = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let body = send_for_body(http, error_message).await?;
        parse_response(&body)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
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
        let provider = GeminiProvider::new(
            reqwest::Client::new(),
            "https://api.test",
            "key-secret".to_string(),
            "some-model".to_string(),
        );
        let printed = format!("{provider:?}");
        assert!(!printed.contains("key-secret"));
        assert!(printed.contains("some-model"));
    }

    #[test]
    fn joins_text_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"name\":"},{"text":"\"Soup\"}"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), r#"{"name":"Soup"}"#);
    }

    #[test]
    fn blocked_prompt_has_no_candidates() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(parse_response(body), Err(LlmError::ParseError(_))));
    }

    #[test]
    fn request_uses_camel_case_fields() {
        let body = GenerateRequest {
            system_instruction: None,
            contents: vec![],
            generation_config: GenerationConfig {
                max_output_tokens: 10,
                temperature: None,
                response_mime_type: Some("application/json"),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 10);
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/v1beta/",
            "key".to_string(),
            "gemini-2.0-flash".to_string(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
