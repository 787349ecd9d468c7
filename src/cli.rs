//! Command-line interface definition for `mf`.

use crate::error::MfError;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;

#[derive(Parser, Debug)]
#[command(name = "mf", disable_help_subcommand = true)]
#[command(author, version, about = "Welcome to Mindflow. A command line tool for intelligent development and collaboration.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs a `git diff` and summarizes the changes
    #[command(after_help = "Pass git options after `--`, e.g. `mf diff -s -- --cached`.")]
    Diff {
        /// Arguments passed through to git diff
        #[arg(value_name = "GIT DIFF ARGS")]
        diffargs: Vec<String>,

        #[command(flatten)]
        output: OutputFlags,
    },
    /// Ask a query using files, folders and web pages as references
    #[command(alias = "q")]
    Query {
        /// The query you want to make on some data
        query: String,

        /// References to use (file path, folder path, web address)
        #[arg(required = true, num_args = 1..)]
        references: Vec<String>,

        #[command(flatten)]
        output: OutputFlags,
    },
    /// Prompt the model directly
    Ask {
        /// Prompt for the model
        prompt: String,

        #[command(flatten)]
        output: OutputFlags,
    },
    /// Authorize Mindflow with a token
    Auth {
        /// Token used to authorize usage (read from stdin when omitted)
        token: Option<String>,
    },
}

/// Output flags shared by diff, query and ask.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    /// Generate prompt only
    #[arg(short = 's', long)]
    pub skip_response: bool,

    /// Do not copy to clipboard
    #[arg(short = 't', long)]
    pub skip_clipboard: bool,
}

/// Outcome of parsing argv.
#[derive(Debug)]
pub enum Parsed {
    Run(Cli),
    /// Unknown or missing subcommand.
    Unrecognized(MfError),
    /// Help, version, or a usage error for a known subcommand.
    Clap(clap::Error),
}

/// Parse process arguments.
pub fn parse_from<I, T>(args: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Ok(cli) => Parsed::Run(cli),
        Err(err) => match err.kind() {
            ErrorKind::InvalidSubcommand => {
                let name = args
                    .get(1)
                    .map(|a| a.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Parsed::Unrecognized(MfError::UnrecognizedCommand(name))
            }
            ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Parsed::Unrecognized(MfError::MissingCommand)
            }
            _ => Parsed::Clap(err),
        },
    }
}

/// Usage text printed for unrecognized commands.
pub fn usage() -> String {
    use clap::CommandFactory;
    Cli::command().render_help().to_string()
}
