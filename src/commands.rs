//! Handlers for each `mf` subcommand.
//!
//! A [`Session`] owns every collaborator a command needs, so tests can swap
//! in an in-memory token store, a recording backend and a fake clipboard.

use crate::cli::{Commands, OutputFlags};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::error::MfError;
use crate::prompt;
use crate::references::ReferenceResolver;
use crate::response::ResponseClient;
use crate::token::TokenStore;
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Session {
    pub config: Config,
    pub tokens: Arc<dyn TokenStore>,
    pub client: ResponseClient,
    pub resolver: ReferenceResolver,
    pub clipboard: Box<dyn Clipboard>,
    /// Directory `git diff` runs in.
    pub workdir: PathBuf,
    /// Where `auth` writes the default config when none exists yet.
    pub config_path: Option<PathBuf>,
}

impl Session {
    /// Run one command and return the text to print.
    pub async fn run(&mut self, command: Commands) -> Result<String, MfError> {
        match command {
            Commands::Diff { diffargs, output } => self.diff(&diffargs, output).await,
            Commands::Query {
                query,
                references,
                output,
            } => self.query(&query, &references, output).await,
            Commands::Ask { prompt, output } => self.ask(&prompt, output).await,
            Commands::Auth { token } => {
                let token = match token {
                    Some(token) => token,
                    None => read_token_from_stdin()
                        .map_err(|e| MfError::InvalidToken(format!("{:#}", e)))?,
                };
                self.auth(&token)
            }
        }
    }

    async fn diff(&mut self, args: &[String], output: OutputFlags) -> Result<String, MfError> {
        self.precheck(output)?;
        let diff = prompt::run_git_diff(&self.workdir, args)?;
        let prompt = prompt::diff_prompt(&diff);
        self.respond(prompt, output).await
    }

    async fn query(
        &mut self,
        query: &str,
        references: &[String],
        output: OutputFlags,
    ) -> Result<String, MfError> {
        self.precheck(output)?;
        let corpus = self.resolver.resolve(references).await?;
        info!(
            "Resolved {} references into {} entries",
            references.len(),
            corpus.entries().len()
        );
        let prompt = prompt::query_prompt(query, &corpus);
        self.respond(prompt, output).await
    }

    async fn ask(&mut self, prompt: &str, output: OutputFlags) -> Result<String, MfError> {
        self.precheck(output)?;
        self.respond(prompt.to_string(), output).await
    }

    fn auth(&mut self, token: &str) -> Result<String, MfError> {
        self.tokens.set(token)?;
        if let Some(path) = self.config_path.as_deref().filter(|p| !p.exists()) {
            match self.config.save_to(path) {
                Ok(()) => info!("Wrote default configuration to {}", path.display()),
                Err(e) => warn!("Could not write configuration: {:#}", e),
            }
        }
        Ok("Token saved.".to_string())
    }

    /// Fail early on a missing token when a response will be requested.
    fn precheck(&self, output: OutputFlags) -> Result<(), MfError> {
        if output.skip_response {
            return Ok(());
        }
        self.client.require_token()
    }

    /// Check the prompt, fetch the response unless skipped, copy the result.
    async fn respond(&mut self, prompt: String, output: OutputFlags) -> Result<String, MfError> {
        if prompt.trim().is_empty() {
            return Err(MfError::EmptyPrompt);
        }
        prompt::check_size(&prompt, self.config.limits.max_prompt_chars)?;

        let text = if output.skip_response {
            prompt
        } else {
            self.client.get_response(&prompt).await?
        };

        if !output.skip_clipboard {
            if let Err(e) = self.clipboard.copy(&text) {
                warn!("Could not copy to clipboard: {:#}", e);
            }
        }
        Ok(text)
    }
}

fn read_token_from_stdin() -> Result<String> {
    eprint!("Token: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read token from stdin")?;
    Ok(line.trim().to_string())
}
