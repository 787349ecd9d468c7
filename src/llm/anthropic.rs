//! Anthropic Claude backend implementation.

use super::{status_error, transport_error};
use crate::config::Generation;
use crate::error::MfError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic backend for Claude API.
pub struct AnthropicBackend {
    pub model: String,
    endpoint: String,
    generation: Generation,
    client: Client,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend.
    pub fn new(
        client: Client,
        model: String,
        endpoint: Option<String>,
        generation: Generation,
    ) -> Self {
        Self {
            model,
            endpoint: endpoint.unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            generation,
            client,
        }
    }

    fn request_body(&self, prompt: &str) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.generation.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.generation.temperature,
        }
    }

    /// Send the prompt and return the first text block.
    pub async fn generate(&self, token: &str, prompt: &str) -> Result<String, MfError> {
        debug!("POST {} (model {})", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", token)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| transport_error("Anthropic", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Result<AnthropicError, _> = response.json().await;
            let message = body
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("Anthropic", status, message));
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| MfError::Service(format!("failed to parse Anthropic response: {}", e)))?;

        first_text(anthropic_response)
    }
}

fn first_text(response: AnthropicResponse) -> Result<String, MfError> {
    response
        .content
        .into_iter()
        .find(|c| c.content_type == "text")
        .and_then(|c| c.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| MfError::Service("empty response from Anthropic".to_string()))
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}
