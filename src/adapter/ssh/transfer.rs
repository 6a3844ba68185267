use std::{
    collections::BTreeSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use ssh2::Session;
use tracing::{debug, info};

use super::exec::{self, StepOutcome};
use crate::{adapter::fs::TransferPair, error::DeployError, progress::ProgressView, util::shell_join};

const DEFAULT_MODE: i32 = 0o644;

/// Sends every pair in order. The first failure ends the batch; files sent
/// before it stay on the remote.
pub(super) fn send_files(session: &Session, pairs: &[TransferPair]) -> Result<(), DeployError> {
    create_parent_directories(session, pairs)?;

    ProgressView::with("Uploading files", |progress| {
        let total_items = pairs.len();

        for (i, pair) in pairs.iter().enumerate() {
            if let Err(err) = send_file(session, pair) {
                progress.failure(Some(&*pair.path_name.to_string_lossy()));
                return Err(err);
            }

            progress.report_intermediate(
                (i + 1, total_items),
                Some(pair.path_name.display().to_string().as_str()),
            );
        }

        progress.success(Some(format!("sent {total_items} files").as_str()));
        Ok(())
    })
}

fn send_file(session: &Session, pair: &TransferPair) -> Result<(), DeployError> {
    let transfer_error = |message: String| DeployError::Transfer {
        local: pair.local_source.clone(),
        remote: pair.remote_dest.clone(),
        message,
    };

    let content = fs::read(&pair.local_source).map_err(|err| transfer_error(err.to_string()))?;
    let mode = file_mode(&pair.local_source);

    debug!(%pair, bytes = content.len(), mode = %format!("{mode:o}"), "sending file");

    let mut channel = session
        .scp_send(&pair.remote_dest, mode, content.len() as u64, None)
        .map_err(|err| transfer_error(err.to_string()))?;
    channel
        .write_all(&content)
        .map_err(|err| transfer_error(err.to_string()))?;

    channel
        .send_eof()
        .and_then(|_| channel.wait_eof())
        .and_then(|_| channel.close())
        .and_then(|_| channel.wait_close())
        .map_err(|err| transfer_error(err.to_string()))?;

    Ok(())
}

fn create_parent_directories(session: &Session, pairs: &[TransferPair]) -> Result<(), DeployError> {
    let dirs = parent_directories(pairs);
    let Some(first) = pairs.first() else {
        return Ok(());
    };
    if dirs.is_empty() {
        return Ok(());
    }

    let dirs: Vec<String> = dirs
        .iter()
        .map(|dir| dir.to_string_lossy().into_owned())
        .collect();
    let line = format!(
        "mkdir -p {}",
        shell_join(dirs.iter().map(String::as_str))
    );

    info!(count = dirs.len(), "creating remote directories");
    match exec::run(session, &line, false)? {
        StepOutcome::Succeeded { .. } => Ok(()),
        StepOutcome::Failed { output, exit_code } => Err(DeployError::Transfer {
            local: first.local_source.clone(),
            remote: first.remote_dest.clone(),
            message: format!(
                "mkdir exited with {}: {}",
                exit_code.map_or_else(|| "unknown status".to_string(), |code| code.to_string()),
                output.trim()
            ),
        }),
    }
}

fn parent_directories(pairs: &[TransferPair]) -> BTreeSet<PathBuf> {
    pairs
        .iter()
        .filter_map(|pair| pair.remote_dest.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect()
}

#[cfg(unix)]
fn file_mode(path: &Path) -> i32 {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| (meta.permissions().mode() & 0o777) as i32)
        .unwrap_or(DEFAULT_MODE)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> i32 {
    DEFAULT_MODE
}
