//! Wire-level checks for the HTTP model providers.

use std::time::Duration;

use httpmock::prelude::*;
use ladle_core::llm::{ClaudeProvider, GeminiProvider, OpenAiProvider};
use ladle_core::{CompletionRequest, LlmError, LlmProvider};
use serde_json::json;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system: Some("Reply with JSON.".to_string()),
        prompt: "Extract the recipe".to_string(),
        max_tokens: 256,
        temperature: Some(0.0),
        json_response: true,
    }
}

#[tokio::test]
async fn openai_sends_chat_request() {
    let server = MockServer::start_async().await;
    let completion = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body_includes(
                    r#"{"model":"gpt-4o-mini","response_format":{"type":"json_object"},"messages":[{"role":"system","content":"Reply with JSON."},{"role":"user","content":"Extract the recipe"}]}"#,
                );
            then.status(200).json_body(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"name\":\"Soup\"}"}}]
            }));
        })
        .await;

    let provider = OpenAiProvider::new(
        client(),
        "openai",
        &server.url("/v1"),
        Some("sk-test".to_string()),
        "gpt-4o-mini".to_string(),
    );
    let answer = provider.complete(&request()).await.unwrap();

    assert_eq!(answer, r#"{"name":"Soup"}"#);
    completion.assert_async().await;
}

#[tokio::test]
async fn openai_maps_rate_limit_and_api_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/limited/chat/completions");
            then.status(429).header("retry-after", "7");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/broken/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
        })
        .await;

    let limited = OpenAiProvider::new(client(), "openai", &server.url("/limited"), None, "m".into());
    assert!(matches!(
        limited.complete(&request()).await,
        Err(LlmError::RateLimited { retry_after_secs: Some(7) })
    ));

    let broken = OpenAiProvider::new(client(), "openai", &server.url("/broken"), None, "m".into());
    match broken.complete(&request()).await {
        Err(LlmError::ApiError { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_sends_no_authorization() {
    let server = MockServer::start_async().await;
    let completion = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header_missing("authorization");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "{}"}}]
            }));
        })
        .await;

    let provider = OpenAiProvider::new(client(), "ollama", &server.url("/v1"), None, "llama3.1".into());
    assert_eq!(provider.complete(&request()).await.unwrap(), "{}");
    completion.assert_async().await;
}

#[tokio::test]
async fn gemini_sends_generate_content() {
    let server = MockServer::start_async().await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.0-flash:generateContent")
                .header("x-goog-api-key", "g-test")
                .json_body_includes(r#"{"generationConfig":{"responseMimeType":"application/json"}}"#);
            then.status(200).json_body(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"name\":\"Soup\"}"}]}}]
            }));
        })
        .await;

    let provider = GeminiProvider::new(
        client(),
        &server.url("/v1beta"),
        "g-test".to_string(),
        "gemini-2.0-flash".to_string(),
    );
    assert_eq!(provider.complete(&request()).await.unwrap(), r#"{"name":"Soup"}"#);
    generate.assert_async().await;
}

#[tokio::test]
async fn claude_sends_messages_request() {
    let server = MockServer::start_async().await;
    let messages = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "a-test")
                .header("anthropic-version", "2023-06-01")
                .json_body_includes(r#"{"system":"Reply with JSON.","max_tokens":256}"#);
            then.status(200).json_body(json!({
                "content": [{"type": "text", "text": "{\"name\":\"Soup\"}"}]
            }));
        })
        .await;

    let provider = ClaudeProvider::new(
        client(),
        &server.url("/v1"),
        "a-test".to_string(),
        "claude-3-5-sonnet-20241022".to_string(),
    );
    assert_eq!(provider.complete(&request()).await.unwrap(), r#"{"name":"Soup"}"#);
    messages.assert_async().await;
}
