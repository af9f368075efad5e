//! LLM-backed extraction of a recipe candidate from normalized page text.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::http::parse_http_url;
use crate::llm::{create_provider, CompletionRequest, LlmConfig, LlmError, LlmProvider};
use crate::prompts;
use crate::types::RecipeCandidate;

/// Model calls per extraction when not configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

const MAX_RESPONSE_TOKENS: u32 = 4096;

/// Asks a model for a recipe and checks the answer against the recipe schema.
///
/// A non-conforming answer is retried with the validation problem appended to the
/// prompt, up to `max_attempts` calls in total. Provider failures are not retried.
#[derive(Debug)]
pub struct RecipeExtractor {
    provider: Arc<dyn LlmProvider>,
    max_attempts: u32,
}

impl RecipeExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self::new(create_provider(config)?).with_max_attempts(config.max_attempts))
    }

    /// At least one attempt is always made.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub async fn extract(&self, text: &str) -> Result<RecipeCandidate, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let provider = self.provider.provider_name();
        let model = self.provider.model_name();
        let mut prompt = prompts::render_extraction_prompt(text);
        let mut last_problem = String::new();

        for attempt in 1..=self.max_attempts {
            let request = CompletionRequest {
                system: Some(prompts::SYSTEM_PROMPT.to_string()),
                prompt,
                max_tokens: MAX_RESPONSE_TOKENS,
                temperature: Some(0.0),
                json_response: true,
            };

            let answer = self.provider.complete(&request).await?;
            match parse_candidate(&answer) {
                Ok(candidate) => {
                    debug!(provider, model, attempt, "extracted recipe candidate");
                    return Ok(candidate);
                }
                Err(problem) => {
                    warn!(
                        provider,
                        model,
                        attempt,
                        max_attempts = self.max_attempts,
                        problem = %problem,
                        "model answer did not match recipe schema"
                    );
                    prompt = prompts::render_retry_prompt(text, &problem);
                    last_problem = problem;
                }
            }
        }

        Err(ExtractError::NonConforming(last_problem))
    }
}

/// Parse a raw model answer into a validated candidate.
///
/// Tolerates surrounding prose and markdown fences: the whole answer is tried first,
/// then the first `{` that opens a complete JSON object. Unknown keys are ignored.
/// An empty `image_url` counts as absent.
pub fn parse_candidate(answer: &str) -> Result<RecipeCandidate, String> {
    let object =
        find_json_object(answer).ok_or_else(|| "answer does not contain a JSON object".to_string())?;
    let mut candidate: RecipeCandidate = serde_json::from_value(object)
        .map_err(|e| format!("answer is not a JSON object of the recipe shape: {e}"))?;

    if candidate.name.trim().is_empty() {
        return Err("\"name\" must be a non-empty string".to_string());
    }

    candidate.image_url = match candidate.image_url.take() {
        Some(url) if url.trim().is_empty() => None,
        Some(url) => {
            parse_http_url(&url)
                .map_err(|e| format!("\"image_url\" must be an absolute http(s) URL: {e}"))?;
            Some(url)
        }
        None => None,
    };

    Ok(candidate)
}

fn find_json_object(answer: &str) -> Option<Value> {
    let trimmed = answer.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // Stream-parse from each brace so trailing prose after the object is ignored.
    trimmed.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}
