use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use ssh2::Session;
use tokio::{sync::Mutex, task::JoinError};
use tracing::{debug, warn};

use crate::{adapter::fs::TransferPair, config::Configuration, error::DeployError};

mod connect;
mod exec;
mod transfer;

pub use exec::{command_line, StepOutcome};

#[async_trait]
pub trait RemoteConnector: Sync {
    type Session: RemoteShell;

    async fn connect(&self, config: &Configuration) -> Result<Self::Session, DeployError>;
}

/// A live remote session. Callers must [`dispose`](RemoteShell::dispose) it
/// on every path once connected.
#[async_trait]
pub trait RemoteShell: Send {
    async fn exec(&mut self, command: &str, args: &[&str]) -> Result<StepOutcome, DeployError>;

    async fn put_files(&mut self, pairs: &[TransferPair]) -> Result<(), DeployError>;

    async fn dispose(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SshConnector;

#[async_trait]
impl RemoteConnector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, config: &Configuration) -> Result<SshSession, DeployError> {
        let remote = config.remote.clone();
        let key = config.ssh_key.clone();
        let host = remote.host.clone();

        let session = tokio::task::spawn_blocking(move || connect::open_session(&remote, &key))
            .await
            .map_err(|err| DeployError::SshConnect {
                host,
                message: err.to_string(),
            })??;

        if let Some(banner) = session.banner() {
            debug!(banner, "server banner");
        }

        Ok(SshSession {
            session: Arc::new(Mutex::new(session)),
            working_dir: config.remote.project_path.clone(),
            disposed: false,
        })
    }
}

pub struct SshSession {
    session: Arc<Mutex<Session>>,
    working_dir: PathBuf,
    disposed: bool,
}

impl SshSession {
    async fn blocking<T, F>(&self, work: F) -> Result<T, JoinError>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> T + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || work(&session.blocking_lock())).await
    }
}

#[async_trait]
impl RemoteShell for SshSession {
    async fn exec(&mut self, command: &str, args: &[&str]) -> Result<StepOutcome, DeployError> {
        let line = command_line(&self.working_dir, command, args);
        let for_error = line.clone();

        self.blocking(move |session| exec::run(session, &line, true))
            .await
            .map_err(|err| DeployError::RemoteExec {
                command: for_error,
                message: err.to_string(),
            })?
    }

    async fn put_files(&mut self, pairs: &[TransferPair]) -> Result<(), DeployError> {
        let owned = pairs.to_vec();

        self.blocking(move |session| transfer::send_files(session, &owned))
            .await
            .map_err(|err| DeployError::TransferInterrupted {
                files: pairs.len(),
                message: err.to_string(),
            })?
    }

    async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let disconnected = self
            .blocking(|session| session.disconnect(None, "bye", None))
            .await;

        match disconnected {
            Ok(Ok(())) => debug!("session disposed"),
            Ok(Err(err)) => warn!(%err, "could not disconnect cleanly"),
            Err(err) => warn!(%err, "disconnect task failed"),
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        if let Ok(session) = self.session.try_lock() {
            if let Err(err) = session.disconnect(None, "bye", None) {
                warn!(%err, "could not disconnect dropped session");
            }
        }
    }
}
