use std::process::ExitCode;

pub mod push_changes;
pub mod reset_and_pull;

#[cfg(test)]
pub(crate) mod fake;

pub use push_changes::push_changes;
pub use reset_and_pull::reset_and_pull;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    /// Nothing had changed locally; no connection was opened
    NothingToDo,
    /// Remote steps failed and the configured policy turns that into failure
    StepsFailed { failed: Vec<String> },
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::StepsFailed { .. })
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
