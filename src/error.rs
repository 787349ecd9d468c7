//! Error taxonomy for mindflow commands.
//!
//! Every variant is terminal for the current invocation. The binary reports
//! it once on stderr and exits non-zero.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MfError {
    /// The subcommand name is not one of diff, query, q, ask, auth.
    #[error("Unrecognized command: {0}")]
    UnrecognizedCommand(String),

    #[error("No command given")]
    MissingCommand,

    /// git is missing or `git diff` failed (e.g. not inside a repository).
    #[error("git diff is unavailable: {0}")]
    DiffUnavailable(String),

    #[error("Could not resolve reference `{reference}`: {reason}")]
    UnresolvableReference { reference: String, reason: String },

    #[error("No token is set. Run `mf auth <token>` first.")]
    NoToken,

    #[error("The completion service rejected the token ({0}). Run `mf auth <token>` to set a new one.")]
    Authentication(String),

    #[error("Completion service error: {0}")]
    Service(String),

    /// Connect failures and timeouts. Retried once by the response client.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Refusing to send an empty prompt")]
    EmptyPrompt,

    #[error("Prompt is {length} characters long, above the limit of {max}")]
    PromptTooLarge { length: usize, max: usize },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token storage error: {0}")]
    TokenStorage(String),
}

impl MfError {
    /// Build an [`MfError::UnresolvableReference`] for `reference`.
    pub fn unresolvable(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        MfError::UnresolvableReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Whether a single retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, MfError::Network(_))
    }
}
