use std::{ffi::OsString, path::PathBuf};

use clap::{error::ErrorKind, Parser};
use tracing::debug;

use crate::config::DEFAULT_CONFIG_PATH;

pub const USAGE_HINT: &str = "Please pass --push-changes or --reset-and-pull";

#[derive(Debug, Parser)]
#[command(name = "gitdeploy", version, about)]
pub struct Cli {
    /// Settings file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Upload files changed in the working tree to the remote checkout
    #[arg(long)]
    pub push_changes: bool,

    /// Hard-reset the remote checkout and pull the current local branch
    #[arg(long)]
    pub reset_and_pull: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PushChanges,
    ResetAndPull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config: PathBuf,
}

#[derive(Debug)]
pub enum Dispatch {
    Run(Invocation),
    /// No recognised flag; print [`USAGE_HINT`] and fail
    Usage,
    /// `--help` or `--version`; let clap print and exit
    Exit(clap::Error),
}

impl Cli {
    /// `--push-changes` wins when both flags are present.
    pub fn command(&self) -> Option<Command> {
        if self.push_changes {
            Some(Command::PushChanges)
        } else if self.reset_and_pull {
            Some(Command::ResetAndPull)
        } else {
            None
        }
    }
}

pub fn dispatch<I, T>(args: I) -> Dispatch
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Dispatch::Exit(err)
        }
        Err(err) => {
            debug!(kind = ?err.kind(), "arguments not understood");
            return Dispatch::Usage;
        }
    };

    match cli.command() {
        Some(command) => Dispatch::Run(Invocation {
            command,
            config: cli.config,
        }),
        None => Dispatch::Usage,
    }
}
