//! HTTP-level tests for the Ollama and OpenAI-compatible backends.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use docchat_agent::{LlmClient, LlmProvider, ModelConfig, PromptEnvelope};
use docchat_core::Turn;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(provider: LlmProvider, server: &MockServer) -> ModelConfig {
    ModelConfig {
        provider,
        model_id: "test-model".into(),
        api_key: "sk-test".into(),
        api_base_url: Some(server.uri()),
        ..ModelConfig::default()
    }
}

fn envelope() -> PromptEnvelope {
    PromptEnvelope::compose(
        "sys",
        vec![Turn::human("Q1"), Turn::assistant("A1")],
        None,
        "Q2",
    )
}

#[tokio::test]
async fn test_ollama_chat_request_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "messages": [
                { "role": "system", "content": "sys" },
                { "role": "user", "content": "Q1" },
                { "role": "assistant", "content": "A1" },
                { "role": "user", "content": "Q2" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "message": { "role": "assistant", "content": "A2" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(config(LlmProvider::Ollama, &server));
    assert_eq!(client.complete(&envelope()).await.unwrap(), "A2");
}

#[tokio::test]
async fn test_ollama_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "model not found" })),
        )
        .mount(&server)
        .await;

    let client = LlmClient::new(config(LlmProvider::Ollama, &server));
    let err = client.complete(&envelope()).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_openai_chat_request_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "A2" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(config(LlmProvider::Groq, &server));
    assert_eq!(client.complete(&envelope()).await.unwrap(), "A2");
}

#[tokio::test]
async fn test_openai_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
        )
        .mount(&server)
        .await;

    let client = LlmClient::new(config(LlmProvider::OpenAi, &server));
    let err = client.complete(&envelope()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_unreachable_server_is_error() {
    let server = MockServer::start().await;
    let config = config(LlmProvider::Ollama, &server);
    drop(server);

    let client = LlmClient::new(config);
    assert!(client.complete(&envelope()).await.is_err());
}
