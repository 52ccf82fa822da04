//! Thin wrapper over the `git` CLI.
//!
//! Every command returns an explicit result; callers decide whether a failure
//! is recoverable (existing branch, signing unavailable) or fatal.
use crate::util::truncate_string;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

const STDERR_EXCERPT_BYTES: usize = 2_000;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git executable not found: {0}")]
    NotFound(#[from] which::Error),
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// How the work branch was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Created,
    Existing,
}

/// Whether the commit carries a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitSigning {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
    repo: PathBuf,
}

impl Git {
    /// Find `git` on PATH and bind it to a working tree.
    pub fn locate(repo: &Path) -> Result<Self, GitError> {
        let program = which::which("git")?;
        Ok(Self {
            program,
            repo: repo.to_path_buf(),
        })
    }

    /// Run a git command in the working tree and return its stdout.
    pub fn run<I, S>(&self, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        let command = display_command(&args);
        tracing::info!(command = %command, repo = %self.repo.display(), "running git");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.repo)
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Failed {
                command,
                status: output.status.to_string(),
                stderr: truncate_string(stderr.trim(), STDERR_EXCERPT_BYTES),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(["checkout", branch]).map(drop)
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(["pull", remote, branch]).map(drop)
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        self.run(["rev-parse", "--verify", "--quiet", reference.as_str()])
            .is_ok()
    }

    /// Create and switch to `branch`, or switch to it when it already exists.
    pub fn create_or_switch_branch(&self, branch: &str) -> Result<BranchState, GitError> {
        match self.run(["checkout", "-b", branch]) {
            Ok(_) => Ok(BranchState::Created),
            Err(err) if self.branch_exists(branch) => {
                tracing::debug!(error = %err, branch, "branch already exists");
                self.checkout(branch)?;
                Ok(BranchState::Existing)
            }
            Err(err) => Err(err),
        }
    }

    pub fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        self.run(["branch", "-d", branch]).map(drop)
    }

    /// Stage exactly the given paths.
    pub fn add(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        let mut args: Vec<OsString> = vec!["add".into(), "--".into()];
        args.extend(paths.iter().map(|path| path.as_os_str().to_os_string()));
        self.run(args).map(drop)
    }

    /// Commit signed, falling back to an unsigned commit when signing fails.
    pub fn commit(&self, message: &str) -> Result<CommitSigning, GitError> {
        match self.run(["commit", "-S", "-m", message]) {
            Ok(_) => Ok(CommitSigning::Signed),
            Err(err @ GitError::Failed { .. }) => {
                tracing::warn!(error = %err, "signed commit failed, retrying unsigned");
                self.run(["commit", "-m", message])?;
                Ok(CommitSigning::Unsigned)
            }
            Err(err) => Err(err),
        }
    }

    pub fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(["push", "-u", remote, branch]).map(drop)
    }
}

fn display_command(args: &[OsString]) -> String {
    let words: Vec<String> = std::iter::once("git".to_string())
        .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
        .collect();
    shell_words::join(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_displayed_shell_quoted() {
        let args: Vec<OsString> = vec!["commit".into(), "-m".into(), "chore: remove user T-1".into()];
        assert_eq!(
            display_command(&args),
            "git commit -m 'chore: remove user T-1'"
        );
    }

    #[test]
    fn failures_carry_command_and_stderr() {
        let err = GitError::Failed {
            command: "git push -u origin access/T-1".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`git push -u origin access/T-1` failed (exit status: 1): rejected"
        );
    }
}
