use std::{
    path::{Path, PathBuf},
    process::Output,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::fs::ChangedFiles;
use crate::error::DeployError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub message: String,
    pub author_name: String,
}

#[async_trait]
pub trait VersionControl: Sync {
    /// Files that differ between the working tree and the index, relative
    /// to the project directory.
    async fn list_changed_files(&self) -> Result<ChangedFiles, DeployError>;

    /// `None` when HEAD is detached or unborn.
    async fn current_branch(&self) -> Result<Option<String>, DeployError>;

    async fn current_commit_hash(&self) -> Result<Option<String>, DeployError>;

    async fn last_commit_info(&self) -> Result<Option<CommitInfo>, DeployError>;
}

#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Output, DeployError> {
        debug!(root = %self.root.display(), ?args, "running git");

        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|err| DeployError::VcsQuery {
                command: args.join(" "),
                message: format!("could not start git: {err}"),
            })
    }

    /// Stdout of a successful invocation, `None` for the quiet "not found"
    /// exit code 1, an error for anything else.
    async fn git_optional(&self, args: &[&str]) -> Result<Option<String>, DeployError> {
        let output = self.git(args).await?;

        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Some(1) => Ok(None),
            _ => Err(query_failed(args, &output)),
        }
    }
}

fn query_failed(args: &[&str], output: &Output) -> DeployError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    DeployError::VcsQuery {
        command: args.join(" "),
        message: match stderr.trim() {
            "" => format!("exited with {}", output.status),
            stderr => stderr.to_string(),
        },
    }
}

#[async_trait]
impl VersionControl for GitRepository {
    async fn list_changed_files(&self) -> Result<ChangedFiles, DeployError> {
        // `--relative` keeps paths relative to the project directory even when
        // it is below the repository top level; `-z` turns off path quoting.
        let args = ["diff", "--name-only", "--relative", "-z"];
        let output = self.git(&args).await?;

        if !output.status.success() {
            return Err(query_failed(&args, &output));
        }

        Ok(ChangedFiles::from_nul_separated(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    async fn current_branch(&self) -> Result<Option<String>, DeployError> {
        let branch = self
            .git_optional(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await?;

        Ok(branch.and_then(|branch| non_empty(trim_line_endings(&branch))))
    }

    async fn current_commit_hash(&self) -> Result<Option<String>, DeployError> {
        let hash = self
            .git_optional(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;

        Ok(hash.and_then(|hash| non_empty(trim_line_endings(&hash))))
    }

    async fn last_commit_info(&self) -> Result<Option<CommitInfo>, DeployError> {
        let args = ["log", "-n", "1", "--format=%s%x00%an"];
        let output = self.git(&args).await?;

        if !output.status.success() {
            return Err(query_failed(&args, &output));
        }

        Ok(parse_commit_info(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub fn trim_line_endings(raw: &str) -> &str {
    raw.trim_end_matches(['\r', '\n'])
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parses `<subject>\0<author>` as printed by `git log --format=%s%x00%an`.
pub fn parse_commit_info(raw: &str) -> Option<CommitInfo> {
    let (message, author_name) = trim_line_endings(raw).split_once('\0')?;

    if message.is_empty() && author_name.is_empty() {
        return None;
    }

    Some(CommitInfo {
        message: message.to_string(),
        author_name: author_name.to_string(),
    })
}
