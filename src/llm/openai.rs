//! OpenAI backend implementation.
//!
//! Talks to the chat completions API, or any service that speaks the same
//! wire format when an endpoint override is configured.

use super::{status_error, transport_error};
use crate::config::Generation;
use crate::error::MfError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI backend for GPT API.
pub struct OpenAIBackend {
    pub model: String,
    endpoint: String,
    generation: Generation,
    client: Client,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend.
    pub fn new(
        client: Client,
        model: String,
        endpoint: Option<String>,
        generation: Generation,
    ) -> Self {
        Self {
            model,
            endpoint: endpoint.unwrap_or_else(|| OPENAI_API_URL.to_string()),
            generation,
            client,
        }
    }

    fn request_body(&self, prompt: &str) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
        }
    }

    /// Send the prompt and return the first choice.
    pub async fn generate(&self, token: &str, prompt: &str) -> Result<String, MfError> {
        debug!("POST {} (model {})", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Result<OpenAIError, _> = response.json().await;
            let message = body
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("OpenAI", status, message));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| MfError::Service(format!("failed to parse OpenAI response: {}", e)))?;

        first_choice(openai_response)
    }
}

fn first_choice(response: OpenAIResponse) -> Result<String, MfError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| MfError::Service("empty response from OpenAI".to_string()))
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}
