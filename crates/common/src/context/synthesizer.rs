//! Answer synthesis - the text-completion service that writes the final answer
//!
//! Provides:
//! - The `AnswerService` seam used by the context engine
//! - An Anthropic Messages API implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AnswerConfig;
use crate::errors::{AppError, Result};

/// Text-completion service: system prompt + question in, answer text out
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, system_prompt: &str, question: &str) -> Result<String>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first text block
    fn into_text(self) -> Option<String> {
        self.content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
    }
}

/// Anthropic Messages API client
pub struct AnthropicSynthesizer {
    config: AnswerConfig,
    client: reqwest::Client,
}

impl AnthropicSynthesizer {
    /// Create a new synthesizer. A missing credential is not an error here;
    /// it fails the individual requests that need it.
    pub fn new(config: AnswerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e)
            })?;

        if config.credential().is_none() {
            tracing::warn!("Answer service credential not configured; questions will fail");
        }

        Ok(Self { config, client })
    }
}

#[async_trait]
impl AnswerService for AnthropicSynthesizer {
    async fn answer(&self, system_prompt: &str, question: &str) -> Result<String> {
        let api_key = self.config.credential().ok_or_else(|| AppError::Configuration {
            message: "API key nao configurada".to_string(),
        })?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: question,
            }],
        };

        let response = self.client
            .post(&self.config.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                message: format!("status {}: {}", status, body),
            });
        }

        let body: MessagesResponse = response.json().await.map_err(|e| AppError::Upstream {
            message: format!("Failed to parse response: {}", e),
        })?;

        body.into_text().ok_or_else(|| AppError::Upstream {
            message: "Response contained no text".to_string(),
        })
    }
}
