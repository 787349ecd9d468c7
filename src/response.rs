//! Response client: one prompt in, one completion out.

use crate::error::MfError;
use crate::llm::Completion;
use crate::token::TokenStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends prompts to the configured backend using the stored token.
pub struct ResponseClient {
    backend: Box<dyn Completion>,
    tokens: Arc<dyn TokenStore>,
}

impl ResponseClient {
    pub fn new(backend: Box<dyn Completion>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { backend, tokens }
    }

    /// Fail with [`MfError::NoToken`] unless a token is stored.
    pub fn require_token(&self) -> Result<(), MfError> {
        self.tokens.get().map(|_| ())
    }

    /// Send `prompt` and return the top completion.
    ///
    /// A transient network failure is retried exactly once.
    pub async fn get_response(&self, prompt: &str) -> Result<String, MfError> {
        if prompt.trim().is_empty() {
            return Err(MfError::EmptyPrompt);
        }
        let token = self.tokens.get()?;

        debug!(
            "Sending {} character prompt to {}",
            prompt.chars().count(),
            self.backend.name()
        );

        match self.backend.complete(&token, prompt).await {
            Err(err) if err.is_transient() => {
                warn!("{}; retrying once", err);
                self.backend.complete(&token, prompt).await
            }
            result => result,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::RecordingBackend;
    use super::*;
    use crate::token::MemoryTokenStore;

    fn client(backend: &Arc<RecordingBackend>, token: Option<&str>) -> ResponseClient {
        let tokens: Arc<dyn TokenStore> = match token {
            Some(token) => Arc::new(MemoryTokenStore::with_token(token)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        ResponseClient::new(Box::new(backend.clone()), tokens)
    }

    #[tokio::test]
    async fn test_single_call_with_prompt() {
        let backend = RecordingBackend::replying(vec![Ok("4".to_string())]);
        let response = client(&backend, Some("t")).get_response("What is 2+2?").await;
        assert_eq!(response.unwrap(), "4");
        assert_eq!(backend.calls(), vec!["What is 2+2?".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_prompt_never_sent() {
        let backend = RecordingBackend::replying(vec![]);
        let result = client(&backend, Some("t")).get_response("  \n").await;
        assert!(matches!(result, Err(MfError::EmptyPrompt)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_never_sent() {
        let backend = RecordingBackend::replying(vec![]);
        let client = client(&backend, None);
        assert!(matches!(client.require_token(), Err(MfError::NoToken)));
        let result = client.get_response("hello").await;
        assert!(matches!(result, Err(MfError::NoToken)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let backend = RecordingBackend::replying(vec![
            Err(MfError::Network("connection reset".into())),
            Ok("recovered".to_string()),
        ]);
        let response = client(&backend, Some("t")).get_response("hello").await;
        assert_eq!(response.unwrap(), "recovered");
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_second_transient_failure_is_returned() {
        let backend = RecordingBackend::replying(vec![
            Err(MfError::Network("timed out".into())),
            Err(MfError::Network("timed out".into())),
            Ok("too late".to_string()),
        ]);
        let result = client(&backend, Some("t")).get_response("hello").await;
        assert!(matches!(result, Err(MfError::Network(_))));
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_service_failure_not_retried() {
        let backend = RecordingBackend::replying(vec![
            Err(MfError::Authentication("401".into())),
            Ok("unused".to_string()),
        ]);
        let result = client(&backend, Some("t")).get_response("hello").await;
        assert!(matches!(result, Err(MfError::Authentication(_))));
        assert_eq!(backend.calls().len(), 1);
    }
}
