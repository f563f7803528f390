//! Structured scoring port and its OpenAI-compatible HTTP adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::rubric::{response_schema, FeedbackReport, RubricError};
use crate::config::ScoringConfig;

const USER_AGENT: &str = concat!("exportpitch/", env!("CARGO_PKG_VERSION"));
const SCHEMA_NAME: &str = "pitch_feedback";

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response failed validation: {0}")]
    Schema(#[from] RubricError),
}

/// Produces a validated feedback report for a scoring prompt.
#[async_trait]
pub trait FeedbackScorer: Send + Sync {
    async fn score(&self, prompt: &str, system: &str) -> Result<FeedbackReport, ScoringError>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions scorer requesting strict JSON-schema output.
pub struct HttpScorer {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpScorer {
    pub fn new(config: &ScoringConfig) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl FeedbackScorer for HttpScorer {
    async fn score(&self, prompt: &str, system: &str) -> Result<FeedbackReport, ScoringError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": response_schema()
                }
            }
        });

        tracing::debug!(model = %self.model, "Requesting structured feedback");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoringError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScoringError::Parse("response carried no content".into()))?;

        Ok(FeedbackReport::from_json(&content)?)
    }
}
