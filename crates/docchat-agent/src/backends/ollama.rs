use super::{http_client, LlmBackend};
use crate::config::ModelConfig;
use crate::prompt::PromptEnvelope;
use async_trait::async_trait;
use docchat_core::{DocchatError, DocchatResult};

/// Backend for a local Ollama server (`POST /api/chat`, non-streaming).
pub struct OllamaBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: ModelConfig) -> Self {
        let http = http_client(config.request_timeout());
        Self { config, http }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, envelope: &PromptEnvelope) -> DocchatResult<String> {
        let url = format!("{}/api/chat", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "messages": envelope.chat_messages(),
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });

        let mut request = self.http.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let resp = request
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
                "Ollama API error {status}: {resp_body}"
            )));
        }

        parse_ollama_response(&resp_body)
    }
}

pub fn parse_ollama_response(body: &serde_json::Value) -> DocchatResult<String> {
    if let Some(error) = body["error"].as_str() {
        return Err(DocchatError::Http(format!("Ollama error: {error}")));
    }
    Ok(body["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}
