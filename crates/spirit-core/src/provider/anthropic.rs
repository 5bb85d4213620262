//! Anthropic Messages API client for card text generation.
//!
//! Sends the quiz prompt as a single user message and parses the first text
//! block of the reply into a [`Card`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CardGenerator;
use crate::card::{parse_card, prompt, Card};
use crate::config::AnthropicConfig;
use crate::error::{SpiritError, SpiritResult};
use crate::quiz::model::AnswerSet;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for generating card content with Claude.
#[derive(Clone)]
pub struct AnthropicCardClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl AnthropicCardClient {
    /// Create a new client from configuration. Fails when no API key is set.
    pub fn new(config: &AnthropicConfig, client: reqwest::Client) -> SpiritResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SpiritError::config("ANTHROPIC_API_KEY is not set"))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Send a prompt and return the text of the first text block.
    async fn complete(&self, prompt: String) -> SpiritResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        debug!(model = %self.model, "Calling Claude Messages API");
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpiritError::Transport(format!(
                "Claude API error (HTTP {}): {}",
                status, body
            )));
        }

        let body = response.text().await?;
        extract_text(&body)
    }
}

/// Pull the first text block out of a Messages API response body.
fn extract_text(body: &str) -> SpiritResult<String> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        SpiritError::MalformedResponse(format!("failed to parse Claude API response: {}", e))
    })?;

    parsed
        .content
        .into_iter()
        .find(|c| c.content_type == "text")
        .and_then(|c| c.text)
        .ok_or_else(|| SpiritError::MalformedResponse("No text response from Claude".to_string()))
}

#[async_trait]
impl CardGenerator for AnthropicCardClient {
    async fn generate_card(&self, answers: &AnswerSet) -> SpiritResult<Card> {
        let text = self.complete(prompt::card_prompt(answers)).await?;
        debug!(chars = text.len(), "Received card text");
        parse_card(&text)
    }
}
