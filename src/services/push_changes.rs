use tracing::{info, warn};

use super::FlowOutcome;
use crate::{
    adapter::{
        git::VersionControl,
        ssh::{RemoteConnector, RemoteShell},
    },
    config::Configuration,
    error::DeployError,
    progress::Reporter,
};

pub async fn push_changes<V, C>(
    config: &Configuration,
    vcs: &V,
    connector: &C,
    reporter: &mut Reporter,
) -> Result<FlowOutcome, DeployError>
where
    V: VersionControl,
    C: RemoteConnector,
{
    let changed_files = vcs.list_changed_files().await?;

    if changed_files.is_empty() {
        reporter.line("No changed files found");
        return Ok(FlowOutcome::NothingToDo);
    }

    reporter.step(format!("{} changed files found", changed_files.len()));
    reporter.step(format!("Connecting to {}...", config.remote.host));

    let mut session = connector.connect(config).await?;

    reporter.step("Connected!");
    reporter.step("Uploading files...");

    let pairs = changed_files.transfer_pairs(&config.local.project_path, &config.remote.project_path);
    for pair in &pairs {
        info!(%pair, "queued for upload");
    }

    let transferred = session.put_files(&pairs).await;
    session.dispose().await;

    if let Err(err) = &transferred {
        warn!(%err, "upload stopped; files sent before the failure remain on the remote");
    }
    transferred?;

    reporter.step("Done");
    Ok(FlowOutcome::Completed)
}
