//! LLM backend implementations.
//!
//! This module provides a unified interface for the remote completion
//! services mindflow can talk to. Each backend sends a single user message
//! and returns the text of the top completion.

pub mod anthropic;
pub mod openai;

use crate::config::{BackendConfig, Config};
use crate::error::MfError;
use async_trait::async_trait;
use std::time::Duration;

/// A remote completion service.
///
/// The credential is passed per call so the token store stays the single
/// owner of it.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Send `prompt` verbatim and return the top completion.
    async fn complete(&self, token: &str, prompt: &str) -> Result<String, MfError>;

    /// Backend name, for logging.
    fn name(&self) -> &'static str;
}

/// Enum-based backend for the supported providers.
pub enum Backend {
    OpenAI(openai::OpenAIBackend),
    Anthropic(anthropic::AnthropicBackend),
}

#[async_trait]
impl Completion for Backend {
    async fn complete(&self, token: &str, prompt: &str) -> Result<String, MfError> {
        match self {
            Backend::OpenAI(b) => b.generate(token, prompt).await,
            Backend::Anthropic(b) => b.generate(token, prompt).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::OpenAI(_) => "openai",
            Backend::Anthropic(_) => "anthropic",
        }
    }
}

/// Create a backend from configuration.
pub fn create_backend(config: &Config) -> Result<Backend, MfError> {
    let client = http_client(config.limits.timeout_secs)?;
    let generation = config.generation.clone();
    let backend = match &config.backend {
        BackendConfig::OpenAI { model, endpoint } => Backend::OpenAI(openai::OpenAIBackend::new(
            client,
            model.clone(),
            endpoint.clone(),
            generation,
        )),
        BackendConfig::Anthropic { model, endpoint } => {
            Backend::Anthropic(anthropic::AnthropicBackend::new(
                client,
                model.clone(),
                endpoint.clone(),
                generation,
            ))
        }
    };
    Ok(backend)
}

/// Build an HTTP client with a fixed timeout for every request.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, MfError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("mindflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MfError::Service(format!("failed to create HTTP client: {}", e)))
}

/// Map a transport failure. Connect errors and timeouts are transient.
fn transport_error(provider: &str, err: reqwest::Error) -> MfError {
    if err.is_connect() || err.is_timeout() {
        MfError::Network(format!("failed to reach {}: {}", provider, err))
    } else {
        MfError::Service(format!("request to {} failed: {}", provider, err))
    }
}

/// Map a non-success HTTP status. 401 and 403 mean the token was rejected.
fn status_error(provider: &str, status: reqwest::StatusCode, message: String) -> MfError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        MfError::Authentication(format!("{} returned {}: {}", provider, status, message))
    } else {
        MfError::Service(format!(
            "{} API request failed with status {}: {}",
            provider, status, message
        ))
    }
}
