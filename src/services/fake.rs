//! In-memory stand-ins for git and the remote host.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    adapter::{
        fs::{ChangedFiles, TransferPair},
        git::{CommitInfo, VersionControl},
        ssh::{RemoteConnector, RemoteShell, StepOutcome},
    },
    config::{Configuration, LocalSettings, RemoteSettings, SshKey, StepFailurePolicy},
    error::DeployError,
    util::shell_join,
};

pub fn test_configuration() -> Configuration {
    Configuration {
        local: LocalSettings {
            project_path: PathBuf::from("/work/project"),
        },
        remote: RemoteSettings {
            host: "example.com".to_string(),
            port: 22,
            user: "deploy".to_string(),
            project_path: PathBuf::from("/srv/project"),
        },
        ssh_key: SshKey {
            path: Some(PathBuf::from("/keys/id_ed25519")),
            ..SshKey::default()
        },
        on_step_failure: StepFailurePolicy::Continue,
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakeRepository {
    pub diff_output: String,
    pub diff_fails: bool,
    pub branch: Option<String>,
    pub hash: Option<String>,
    pub last_commit: Option<CommitInfo>,
}

impl FakeRepository {
    pub fn with_changes(diff_output: &str) -> Self {
        Self {
            diff_output: diff_output.to_string(),
            ..Self::default()
        }
    }

    pub fn with_commit(branch: &str, hash: &str, message: &str, author_name: &str) -> Self {
        Self {
            branch: Some(branch.to_string()),
            hash: Some(hash.to_string()),
            last_commit: Some(CommitInfo {
                message: message.to_string(),
                author_name: author_name.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[async_trait]
impl VersionControl for FakeRepository {
    async fn list_changed_files(&self) -> Result<ChangedFiles, DeployError> {
        if self.diff_fails {
            return Err(DeployError::VcsQuery {
                command: "diff --name-only".to_string(),
                message: "not a git repository".to_string(),
            });
        }

        Ok(ChangedFiles::from_diff_output(&self.diff_output))
    }

    async fn current_branch(&self) -> Result<Option<String>, DeployError> {
        Ok(self.branch.clone())
    }

    async fn current_commit_hash(&self) -> Result<Option<String>, DeployError> {
        Ok(self.hash.clone())
    }

    async fn last_commit_info(&self) -> Result<Option<CommitInfo>, DeployError> {
        Ok(self.last_commit.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Connect,
    Exec(String),
    PutFiles(Vec<TransferPair>),
    Dispose,
}

type CallLog = Arc<Mutex<Vec<RemoteCall>>>;

/// Records every remote interaction instead of performing it.
#[derive(Debug, Default)]
pub struct FakeConnector {
    pub fail_connect: bool,
    pub fail_transfer: bool,
    /// Commands that exit non-zero
    pub failing_commands: Vec<String>,
    /// Commands whose channel breaks before an exit status arrives
    pub broken_commands: Vec<String>,
    pub log: CallLog,
}

impl FakeConnector {
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, config: &Configuration) -> Result<FakeSession, DeployError> {
        self.log.lock().unwrap().push(RemoteCall::Connect);

        if self.fail_connect {
            return Err(DeployError::SshConnect {
                host: config.remote.host.clone(),
                message: "connection refused".to_string(),
            });
        }

        Ok(FakeSession {
            fail_transfer: self.fail_transfer,
            failing_commands: self.failing_commands.clone(),
            broken_commands: self.broken_commands.clone(),
            log: self.log.clone(),
            disposed: false,
        })
    }
}

pub struct FakeSession {
    fail_transfer: bool,
    failing_commands: Vec<String>,
    broken_commands: Vec<String>,
    log: CallLog,
    disposed: bool,
}

#[async_trait]
impl RemoteShell for FakeSession {
    async fn exec(&mut self, command: &str, args: &[&str]) -> Result<StepOutcome, DeployError> {
        let line = shell_join(std::iter::once(command).chain(args.iter().copied()));
        self.log.lock().unwrap().push(RemoteCall::Exec(line.clone()));

        if self.broken_commands.contains(&line) {
            return Err(DeployError::RemoteExec {
                command: line,
                message: "channel closed".to_string(),
            });
        }

        if self.failing_commands.contains(&line) {
            return Ok(StepOutcome::from_exit(1, "simulated failure\n".to_string()));
        }

        Ok(StepOutcome::from_exit(0, String::new()))
    }

    async fn put_files(&mut self, pairs: &[TransferPair]) -> Result<(), DeployError> {
        self.log
            .lock()
            .unwrap()
            .push(RemoteCall::PutFiles(pairs.to_vec()));

        match (self.fail_transfer, pairs.first()) {
            (true, Some(pair)) => Err(DeployError::Transfer {
                local: pair.local_source.clone(),
                remote: pair.remote_dest.clone(),
                message: "no such file".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.log.lock().unwrap().push(RemoteCall::Dispose);
        }
    }
}
