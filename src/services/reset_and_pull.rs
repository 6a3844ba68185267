use std::fmt::Display;

use tracing::warn;

use super::FlowOutcome;
use crate::{
    adapter::{
        git::{CommitInfo, VersionControl},
        ssh::{RemoteConnector, RemoteShell, StepOutcome},
    },
    config::{Configuration, StepFailurePolicy},
    error::{DeployError, MissingState},
    progress::Reporter,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDescriptor {
    pub branch: String,
    pub hash: String,
    pub last_commit: CommitInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStep {
    pub command: &'static str,
    pub args: Vec<String>,
}

impl RemoteStep {
    fn git(args: &[&str]) -> Self {
        Self {
            command: "git",
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

impl Display for RemoteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub fn sync_steps(branch: &str) -> [RemoteStep; 3] {
    [
        RemoteStep::git(&["reset", "--hard", "HEAD"]),
        RemoteStep::git(&["checkout", branch]),
        RemoteStep::git(&["pull", "origin", branch]),
    ]
}

/// Reads branch, hash and last commit, in that order. The first absent
/// value stops the flow.
pub async fn read_commit_descriptor<V: VersionControl>(
    vcs: &V,
) -> Result<CommitDescriptor, DeployError> {
    let branch = vcs.current_branch().await?.ok_or(MissingState::Branch)?;
    let hash = vcs
        .current_commit_hash()
        .await?
        .ok_or(MissingState::CommitHash)?;
    let last_commit = vcs
        .last_commit_info()
        .await?
        .ok_or(MissingState::CommitMessage)?;

    Ok(CommitDescriptor {
        branch,
        hash,
        last_commit,
    })
}

pub async fn reset_and_pull<V, C>(
    config: &Configuration,
    vcs: &V,
    connector: &C,
    reporter: &mut Reporter,
) -> Result<FlowOutcome, DeployError>
where
    V: VersionControl,
    C: RemoteConnector,
{
    let descriptor = read_commit_descriptor(vcs).await?;

    reporter.step("Syncing server to");
    reporter.line(format!("    {}:{}", descriptor.branch, descriptor.hash));
    reporter.line(format!(
        "    {} | {}",
        descriptor.last_commit.message, descriptor.last_commit.author_name
    ));

    reporter.step(format!("Connecting to {}...", config.remote.host));
    let mut session = connector.connect(config).await?;
    reporter.step("Connected!");

    let steps = sync_steps(&descriptor.branch);
    let run = run_steps(&mut session, &steps, config.on_step_failure, reporter).await;

    if run.attempted < steps.len() {
        reporter.step("Aborted");
    } else {
        reporter.step("Done");
    }
    session.dispose().await;

    let failed = run.failed;

    match config.on_step_failure {
        StepFailurePolicy::Continue => Ok(FlowOutcome::Completed),
        _ if failed.is_empty() => Ok(FlowOutcome::Completed),
        _ => Ok(FlowOutcome::StepsFailed { failed }),
    }
}

struct StepRun {
    attempted: usize,
    failed: Vec<String>,
}

async fn run_steps<S: RemoteShell>(
    session: &mut S,
    steps: &[RemoteStep],
    policy: StepFailurePolicy,
    reporter: &mut Reporter,
) -> StepRun {
    let mut run = StepRun {
        attempted: 0,
        failed: Vec::new(),
    };

    for step in steps {
        reporter.step(step);
        run.attempted += 1;

        let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
        let outcome = match session.exec(step.command, &args).await {
            Ok(outcome) => outcome,
            Err(err) => StepOutcome::Failed {
                output: err.to_string(),
                exit_code: None,
            },
        };

        let output = outcome.output().trim_end();
        if !output.is_empty() {
            reporter.line(output);
        }

        if let StepOutcome::Failed { exit_code, .. } = &outcome {
            warn!(step = %step, ?exit_code, ?policy, "remote step failed");
            run.failed.push(step.to_string());

            if policy == StepFailurePolicy::Abort {
                break;
            }
        }
    }

    run
}
