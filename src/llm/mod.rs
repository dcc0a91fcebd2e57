//! LLM Backend Module
//!
//! Single-turn text generation behind the `TextGenerator` trait. The
//! diagnosis and resolution stages only ever see the trait, so tests run
//! against scripted generators and production runs against `OpenAiClient`.
//!
//! Replies are treated as untrusted text: `parsing` strips reasoning blocks
//! and extracts the first JSON object before anything is deserialized.

use async_trait::async_trait;

mod openai;
pub mod parsing;

pub use openai::OpenAiClient;
pub use parsing::{extract_json_object, strip_think_tags, ExtractError};

/// Text generation errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Unified trait for text generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `prompt` under `system` using `model`.
    async fn generate(&self, system: &str, prompt: &str, model: &str) -> Result<String, LlmError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
