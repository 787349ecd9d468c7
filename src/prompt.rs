//! Prompt generation for the diff, ask and query commands.

use crate::error::MfError;
use crate::references::Corpus;
use std::path::Path;
use std::process::Command;
use tracing::debug;

const DIFF_INSTRUCTIONS: &str = "Summarize the following git diff. \
Start with a one-line overview of the change, then list the notable changes file by file. \
Mention anything that looks like a bug or an unfinished change.";

const NO_CHANGES_PROMPT: &str = "The git diff for this repository is empty: there are no changes. \
Reply briefly that there is nothing to summarize.";

const QUERY_INSTRUCTIONS: &str =
    "Answer the query below using the provided references. Cite the reference names you rely on.";

/// Run `git diff` in `workdir` with pass-through arguments.
pub fn run_git_diff(workdir: &Path, args: &[String]) -> Result<String, MfError> {
    debug!("Running git diff {:?} in {}", args, workdir.display());

    let output = Command::new("git")
        .args(["--no-pager", "diff", "--no-color"])
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MfError::DiffUnavailable("git is not installed or not on PATH".to_string())
            } else {
                MfError::DiffUnavailable(format!("failed to run git: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let reason = if stderr.is_empty() {
            format!("git diff exited with {}", output.status)
        } else {
            stderr
        };
        return Err(MfError::DiffUnavailable(reason));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Wrap diff output in the summary template.
pub fn diff_prompt(diff: &str) -> String {
    if diff.trim().is_empty() {
        return NO_CHANGES_PROMPT.to_string();
    }
    format!("{}\n\n```diff\n{}\n```", DIFF_INSTRUCTIONS, diff.trim_end())
}

/// Build the prompt for `query`: the user's query followed by the corpus.
pub fn query_prompt(query: &str, corpus: &Corpus) -> String {
    format!(
        "{}\n\nQuery: {}\n\nReferences:\n\n{}",
        QUERY_INSTRUCTIONS,
        query.trim(),
        corpus.render()
    )
}

/// Reject prompts above `max_chars` characters.
pub fn check_size(prompt: &str, max_chars: usize) -> Result<(), MfError> {
    let length = prompt.chars().count();
    if length > max_chars {
        return Err(MfError::PromptTooLarge {
            length,
            max: max_chars,
        });
    }
    Ok(())
}

/// Scratch git repositories for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .is_ok_and(|out| out.status.success())
    }

    /// An empty repository, or `None` when git is not installed.
    pub(crate) fn git_repo() -> Option<tempfile::TempDir> {
        let dir = tempfile::Builder::new().prefix("mfgit").tempdir().unwrap();
        git(dir.path(), &["init", "-q"]).then_some(dir)
    }

    /// Stage `name` with `contents`.
    pub(crate) fn stage(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
        assert!(git(dir, &["add", name]), "git add {name} failed");
    }

    /// Whether `dir` sits inside some repository.
    pub(crate) fn inside_repo(dir: &Path) -> bool {
        git(dir, &["rev-parse", "--git-dir"])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{git_repo, inside_repo, stage};
    use super::*;

    #[test]
    fn test_diff_prompt_wraps_diff() {
        let diff = "diff --git a/src/lib.rs b/src/lib.rs\n+fn added() {}\n";
        let prompt = diff_prompt(diff);
        assert!(prompt.starts_with("Summarize the following git diff."));
        assert!(prompt.contains("+fn added() {}"));
        assert!(prompt.ends_with("```"));
    }

    #[test]
    fn test_empty_diff_has_dedicated_prompt() {
        assert_eq!(diff_prompt(""), NO_CHANGES_PROMPT);
        assert_eq!(diff_prompt("\n  \n"), NO_CHANGES_PROMPT);
        assert!(NO_CHANGES_PROMPT.contains("no changes"));
    }

    #[test]
    fn test_query_prompt_orders_query_before_corpus() {
        let mut corpus = Corpus::default();
        corpus.push("notes.md", "the build uses cargo");
        let prompt = query_prompt("  How do we build?  ", &corpus);

        let query_at = prompt.find("Query: How do we build?").unwrap();
        let notes_at = prompt.find("the build uses cargo").unwrap();
        assert!(query_at < notes_at);
        assert!(prompt.contains("notes.md"));
    }

    #[test]
    fn test_check_size_counts_characters() {
        assert!(check_size("héllo", 5).is_ok());
        match check_size("héllo!", 5) {
            Err(MfError::PromptTooLarge { length, max }) => {
                assert_eq!(length, 6);
                assert_eq!(max, 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_failing_git_diff_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["--definitely-not-a-git-option".to_string()];
        let result = run_git_diff(dir.path(), &args);
        assert!(matches!(result, Err(MfError::DiffUnavailable(_))));
    }

    #[test]
    fn test_git_diff_shows_working_tree_changes() {
        let Some(repo) = git_repo() else { return };
        stage(repo.path(), "notes.txt", "first line\n");
        std::fs::write(repo.path().join("notes.txt"), "first line\nsecond line\n").unwrap();

        let diff = run_git_diff(repo.path(), &[]).unwrap();
        assert!(diff.contains("notes.txt"));
        assert!(diff.contains("+second line"));

        let cached = run_git_diff(repo.path(), &["--cached".to_string()]).unwrap();
        assert!(cached.contains("+first line"));
        assert!(!cached.contains("+second line"));
    }

    #[test]
    fn test_clean_repository_has_empty_diff() {
        let Some(repo) = git_repo() else { return };
        assert_eq!(run_git_diff(repo.path(), &[]).unwrap(), "");
    }

    #[test]
    fn test_git_diff_outside_repository_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        if git_repo().is_none() || inside_repo(dir.path()) {
            return;
        }
        match run_git_diff(dir.path(), &[]) {
            Err(MfError::DiffUnavailable(reason)) => assert!(!reason.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
