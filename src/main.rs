use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::error;

use gitdeploy::{
    adapter::{git::GitRepository, ssh::SshConnector},
    cli::{self, Command, Dispatch, Invocation, USAGE_HINT},
    config::read_config,
    error::DeployError,
    logging,
    progress::Reporter,
    services::{push_changes, reset_and_pull, FlowOutcome},
};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let invocation = match cli::dispatch(std::env::args_os()) {
        Dispatch::Run(invocation) => invocation,
        Dispatch::Usage => {
            println!("{USAGE_HINT}");
            return ExitCode::FAILURE;
        }
        Dispatch::Exit(err) => err.exit(),
    };

    match run(invocation).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            match err.downcast_ref::<DeployError>() {
                Some(DeployError::MissingState(state)) => println!("{state}"),
                _ => {
                    println!("{err:#}");
                    error!(error = %format!("{err:#}"), "deployment failed");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> Result<FlowOutcome> {
    let config = read_config(&invocation.config)
        .with_context(|| format!("could not load settings from {}", invocation.config.display()))?;

    let vcs = GitRepository::new(&config.local.project_path);
    let connector = SshConnector;
    let mut reporter = Reporter::stdout();

    let outcome = match invocation.command {
        Command::PushChanges => push_changes(&config, &vcs, &connector, &mut reporter).await?,
        Command::ResetAndPull => reset_and_pull(&config, &vcs, &connector, &mut reporter).await?,
    };

    if let FlowOutcome::StepsFailed { failed } = &outcome {
        error!(?failed, "remote steps failed");
    }

    Ok(outcome)
}
