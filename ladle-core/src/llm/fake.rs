//! Fake LLM provider for tests and offline runs.
//!
//! Answers come from, in order: a queue of scripted answers, the first registered
//! substring that the prompt contains, then the default answer.

use super::{CompletionRequest, LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct FakeProvider {
    /// (prompt substring, answer), matched case-insensitively in insertion order.
    responses: Vec<(String, String)>,
    scripted: Mutex<VecDeque<String>>,
    default_response: Option<String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeProvider {
    /// A provider with no answers configured; every call fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `response` to prompts containing `prompt_contains`.
    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    /// Answer with these, one per call, before falling back to the other rules.
    pub fn with_script<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.scripted).extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(request.prompt.clone());

        if let Some(answer) = lock(&self.scripted).pop_front() {
            return Ok(answer);
        }

        let prompt_lower = request.prompt.to_lowercase();
        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
        {
            return Ok(response.clone());
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                request.prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest::new(prompt)
    }

    #[tokio::test]
    async fn test_fake_provider_matching() {
        let provider = FakeProvider::new().with_response("HELLO", "world");
        let result = provider.complete(&request("well hello there")).await.unwrap();
        assert_eq!(result, "world");
    }

    #[tokio::test]
    async fn test_fake_provider_no_match() {
        let provider = FakeProvider::new();
        let result = provider.complete(&request("random prompt")).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_provider_script_runs_first() {
        let provider = FakeProvider::new()
            .with_script(["first", "second"])
            .with_default_response("default");

        assert_eq!(provider.complete(&request("a")).await.unwrap(), "first");
        assert_eq!(provider.complete(&request("b")).await.unwrap(), "second");
        assert_eq!(provider.complete(&request("c")).await.unwrap(), "default");
        assert_eq!(provider.prompts(), vec!["a", "b", "c"]);
        assert_eq!(provider.call_count(), 3);
    }
}
