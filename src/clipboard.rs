//! Clipboard output through the platform's clipboard utility.

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

const NO_ARGS: &[&str] = &[];

/// Destination for copied output.
pub trait Clipboard: Send {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// Copies by piping text into `pbcopy`, `wl-copy`, `xclip`, `xsel` or `clip`.
#[derive(Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Candidate commands for this platform, most specific first.
    fn candidates() -> Vec<(&'static str, &'static [&'static str])> {
        if cfg!(target_os = "macos") {
            vec![("pbcopy", NO_ARGS)]
        } else if cfg!(windows) {
            vec![("clip", NO_ARGS)]
        } else {
            let mut candidates: Vec<(&'static str, &'static [&'static str])> = Vec::new();
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                candidates.push(("wl-copy", NO_ARGS));
            }
            candidates.push(("xclip", &["-selection", "clipboard"]));
            candidates.push(("xsel", &["--clipboard", "--input"]));
            candidates
        }
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut tried = Vec::new();
        for (program, args) in Self::candidates() {
            match pipe_into(program, args, text) {
                Ok(()) => {
                    debug!("Copied {} bytes with {}", text.len(), program);
                    return Ok(());
                }
                Err(e) => tried.push(format!("{}: {:#}", program, e)),
            }
        }
        Err(anyhow!("no clipboard utility worked ({})", tried.join("; ")))
    }
}

fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", program))?;

    {
        let stdin = child
            .stdin
            .as_mut()
            .context("failed to open clipboard stdin")?;
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(anyhow!("exited with {}", status));
    }
    Ok(())
}
