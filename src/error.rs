use std::path::PathBuf;

use thiserror::Error;

/// Local repository state the sync flow cannot continue without.
///
/// These are reported to the operator as plain messages, so the display
/// strings are the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingState {
    #[error("Local branch not found")]
    Branch,

    #[error("Local commit hash not found")]
    CommitHash,

    #[error("Local commit message not found")]
    CommitMessage,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("git {command} failed: {message}")]
    VcsQuery { command: String, message: String },

    #[error(transparent)]
    MissingState(#[from] MissingState),

    #[error("could not connect to {host}: {message}")]
    SshConnect { host: String, message: String },

    /// The exec channel itself broke; a non-zero remote exit is not an error
    #[error("remote command `{command}` could not be run: {message}")]
    RemoteExec { command: String, message: String },

    #[error("could not transfer {} -> {}: {message}", local.display(), remote.display())]
    Transfer {
        local: PathBuf,
        remote: PathBuf,
        message: String,
    },

    #[error("upload of {files} files was interrupted: {message}")]
    TransferInterrupted { files: usize, message: String },
}
