use std::{io::Read, path::Path};

use ssh2::Session;
use tracing::debug;

use crate::{error::DeployError, util::shell_join, util::shell_quote};

/// Result of one remote command. A non-zero exit is a value here, the
/// caller decides whether it matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded { output: String },
    Failed { output: String, exit_code: Option<i32> },
}

impl StepOutcome {
    pub fn from_exit(exit_code: i32, output: String) -> Self {
        if exit_code == 0 {
            Self::Succeeded { output }
        } else {
            Self::Failed {
                output,
                exit_code: Some(exit_code),
            }
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Self::Succeeded { output } | Self::Failed { output, .. } => output,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

pub fn command_line(working_dir: &Path, command: &str, args: &[&str]) -> String {
    format!(
        "cd {} && {}",
        shell_quote(&working_dir.to_string_lossy()),
        shell_join(std::iter::once(command).chain(args.iter().copied()))
    )
}

// With a pty the remote merges stderr into the main stream.
pub(super) fn run(session: &Session, line: &str, pty: bool) -> Result<StepOutcome, DeployError> {
    let exec_error = |message: String| DeployError::RemoteExec {
        command: line.to_string(),
        message,
    };

    let mut channel = session
        .channel_session()
        .map_err(|err| exec_error(err.to_string()))?;

    if pty {
        channel
            .request_pty("xterm", None, None)
            .map_err(|err| exec_error(format!("could not allocate a pty: {err}")))?;
    }

    debug!(line, pty, "executing remote command");
    channel
        .exec(line)
        .map_err(|err| exec_error(err.to_string()))?;

    let mut raw = Vec::new();
    channel
        .read_to_end(&mut raw)
        .map_err(|err| exec_error(err.to_string()))?;

    channel
        .wait_close()
        .map_err(|err| exec_error(err.to_string()))?;
    let exit_code = channel
        .exit_status()
        .map_err(|err| exec_error(err.to_string()))?;

    debug!(line, exit_code, "remote command finished");

    let output = String::from_utf8_lossy(&raw).replace("\r\n", "\n");
    Ok(StepOutcome::from_exit(exit_code, output))
}
