//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{LlmError, TextGenerator};
use crate::config::{defaults, OpenAiConfig};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// HTTP client for `{base_url}/chat/completions`
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f64,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &crate::config::mask_api_key(&self.api_key))
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            temperature: config.temperature,
        })
    }

    /// Request body for one `[system, user]` exchange.
    fn request_body(&self, system: &str, prompt: &str, model: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        if uses_default_temperature(model) {
            body["max_completion_tokens"] = defaults::MAX_OUTPUT_TOKENS.into();
        } else {
            body["temperature"] = self.temperature.into();
            body["max_tokens"] = defaults::MAX_OUTPUT_TOKENS.into();
        }
        body
    }
}

/// Whether `model` belongs to the family that only accepts the default temperature.
fn uses_default_temperature(model: &str) -> bool {
    model
        .to_lowercase()
        .contains(defaults::DEFAULT_TEMPERATURE_ONLY_FAMILY)
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, system: &str, prompt: &str, model: &str) -> Result<String, LlmError> {
        let start = Instant::now();

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system, prompt, model))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(
            model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Chat completion received"
        );

        Ok(content)
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}
