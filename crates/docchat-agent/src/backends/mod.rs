pub mod ollama;
pub mod openai;

use crate::prompt::PromptEnvelope;
use async_trait::async_trait;
use docchat_core::DocchatResult;

/// Trait for language model provider backends.
///
/// Each provider (Ollama, OpenAI, Groq, etc.) implements this trait to handle
/// API communication. Tests and embedders can plug in their own backend via
/// [`LlmClient::from_backend`](crate::llm::LlmClient::from_backend).
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` enum in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Non-streaming completion. Returns the assistant's text, which may be
    /// empty when the model produced nothing.
    async fn complete(&self, envelope: &PromptEnvelope) -> DocchatResult<String>;
}

/// Client shared by the HTTP backends. The overall deadline of a call is
/// enforced by the caller, so only connecting is bounded here.
pub(crate) fn http_client(connect_timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
