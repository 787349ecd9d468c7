//! mf - Mindflow, a command line tool for intelligent development and collaboration.
//!
//! Summarizes git diffs, answers queries over files, folders and web pages,
//! and forwards free-form prompts to a remote completion service.

mod cli;
mod clipboard;
mod commands;
mod config;
mod error;
mod llm;
mod prompt;
mod references;
mod response;
mod token;

use anyhow::{Context, Result};
use cli::{Cli, Parsed};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let cli = match cli::parse_from(std::env::args_os()) {
        Parsed::Run(cli) => cli,
        Parsed::Unrecognized(err) => {
            eprintln!("{}", err);
            eprintln!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
        Parsed::Clap(err) => err.exit(),
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `MF_LOG` (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_env("MF_LOG").unwrap_or_else(|_| EnvFilter::new("mf=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Wire the collaborators together and run one command.
async fn run(cli: Cli) -> Result<()> {
    let config_path = config::Config::config_path()?;
    let config =
        config::Config::load_from(&config_path).context("Failed to load configuration")?;
    let tokens: Arc<dyn token::TokenStore> =
        Arc::new(token::FileTokenStore::new(config::Config::token_path()?));

    let backend = llm::create_backend(&config)?;
    debug!(
        "Using backend: {} (model: {})",
        config.backend_type(),
        config.model_name()
    );
    let client = response::ResponseClient::new(Box::new(backend), tokens.clone());
    let resolver = references::ReferenceResolver::new(&config.limits)?;
    let workdir = std::env::current_dir().context("Failed to get current directory")?;

    let mut session = commands::Session {
        config,
        tokens,
        client,
        resolver,
        clipboard: Box::new(clipboard::SystemClipboard),
        workdir,
        config_path: Some(config_path),
    };

    let output = session.run(cli.command).await?;
    println!("{}", output);
    Ok(())
}
