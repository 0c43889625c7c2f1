//! Version-control glue: background commits, pull, push.
//!
//! Every content mutation is followed by a best-effort commit. Best-effort
//! is a hard contract here: the file write is the unit of success, and no
//! git outcome — missing repo, missing identity, detached HEAD, hung
//! remote — may surface to the caller. Failures are logged and dropped.
//!
//! ## Failure classification
//!
//! `git commit` reports problems as prose on stderr/stdout. Classification
//! happens in exactly one place ([`classify_commit_failure`]) and produces
//! a [`CommitFailure`] the retry policy can match on. The policy is finite:
//! a `MissingIdentity` failure configures the repo-local default identity
//! and retries once; every other failure is terminal.
//!
//! Commits run as spawned background tasks with no queue and no timeout:
//! two rapid edits can interleave their git invocations, and a hung
//! subprocess blocks only its own chain (see the concurrency notes in the
//! crate docs).

use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Identity configured when a commit fails for lack of one.
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Why a `git commit` failed, as far as the retry policy cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFailure {
    /// No user.name/user.email configured. The one retryable case.
    MissingIdentity,
    /// Clean tree — the mutation matched what was already committed.
    NothingToCommit,
    Other(String),
}

/// Stage the given paths and commit. Best-effort: logs, never errors.
pub async fn commit_paths(
    repo: &Path,
    identity: &CommitIdentity,
    paths: &[PathBuf],
    message: &str,
) {
    let add_args: Vec<&str> = ["add", "--"]
        .into_iter()
        .chain(paths.iter().filter_map(|p| p.to_str()))
        .collect();
    match run_git(repo, &add_args).await {
        Ok(output) if !output.status.success() => {
            warn!(repo = %repo.display(), stderr = %stderr_of(&output), "git add failed");
            return;
        }
        Err(err) => {
            debug!(repo = %repo.display(), %err, "git unavailable, skipping commit");
            return;
        }
        Ok(_) => {}
    }

    match try_commit(repo, message).await {
        Ok(()) => info!(repo = %repo.display(), commit = message, "committed"),
        Err(CommitFailure::NothingToCommit) => {
            debug!(repo = %repo.display(), "nothing to commit");
        }
        Err(CommitFailure::MissingIdentity) => {
            configure_identity(repo, identity).await;
            match try_commit(repo, message).await {
                Ok(()) => info!(repo = %repo.display(), commit = message, "committed after identity fix"),
                Err(failure) => {
                    warn!(repo = %repo.display(), ?failure, "commit retry failed");
                }
            }
        }
        Err(failure) => warn!(repo = %repo.display(), ?failure, "commit failed"),
    }
}

/// `git pull` from the configured remote. Best-effort.
pub async fn pull(repo: &Path) {
    match run_git(repo, &["pull"]).await {
        Ok(output) if output.status.success() => {
            info!(repo = %repo.display(), "pulled latest content");
        }
        Ok(output) => warn!(repo = %repo.display(), stderr = %stderr_of(&output), "git pull failed"),
        Err(err) => warn!(repo = %repo.display(), %err, "git pull failed to start"),
    }
}

/// `git push`. Best-effort.
pub async fn push(repo: &Path) {
    match run_git(repo, &["push"]).await {
        Ok(output) if output.status.success() => info!(repo = %repo.display(), "pushed"),
        Ok(output) => warn!(repo = %repo.display(), stderr = %stderr_of(&output), "git push failed"),
        Err(err) => warn!(repo = %repo.display(), %err, "git push failed to start"),
    }
}

async fn try_commit(repo: &Path, message: &str) -> Result<(), CommitFailure> {
    let output = run_git(repo, &["commit", "-m", message])
        .await
        .map_err(|err| CommitFailure::Other(err.to_string()))?;
    if output.status.success() {
        return Ok(());
    }
    Err(classify_commit_failure(
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    ))
}

async fn configure_identity(repo: &Path, identity: &CommitIdentity) {
    for (key, value) in [
        ("user.name", identity.name.as_str()),
        ("user.email", identity.email.as_str()),
    ] {
        if let Err(err) = run_git(repo, &["config", key, value]).await {
            warn!(repo = %repo.display(), key, %err, "failed to configure identity");
        }
    }
}

/// Map git's commit diagnostics onto [`CommitFailure`].
fn classify_commit_failure(stdout: &str, stderr: &str) -> CommitFailure {
    let combined = format!("{stdout}\n{stderr}");
    if combined.contains("Author identity unknown")
        || combined.contains("Please tell me who you are")
    {
        return CommitFailure::MissingIdentity;
    }
    if combined.contains("nothing to commit") || combined.contains("nothing added to commit") {
        return CommitFailure::NothingToCommit;
    }
    CommitFailure::Other(stderr.trim().to_string())
}

async fn run_git(repo: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
