use super::{http_client, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use crate::prompt::PromptEnvelope;
use async_trait::async_trait;
use docchat_core::{DocchatError, DocchatResult};

/// OpenAI-compatible API backend.
///
/// Works with OpenAI, OpenRouter, Groq, and any other provider that
/// implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        let http = http_client(config.request_timeout());
        Self { config, http }
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "docchat")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, envelope: &PromptEnvelope) -> DocchatResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": envelope.chat_messages(),
        });

        let request = self.add_provider_headers(self.http.post(&url));

        let resp = request
            .json(&body)
            .send()
            .await
            .map_err(|e| DocchatError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DocchatError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(DocchatError::Http(format!(
                "OpenAI API error {status}: {resp_body}"
            )));
        }

        parse_openai_response(&resp_body)
    }
}

pub fn parse_openai_response(body: &serde_json::Value) -> DocchatResult<String> {
    let choice = &body["choices"][0];
    if choice.is_null() {
        return Err(DocchatError::Http(format!(
            "OpenAI response has no choices: {body}"
        )));
    }
    Ok(choice["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}
