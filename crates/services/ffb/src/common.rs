//! Shared runner plumbing for the build and execute phases.

use std::{
    fmt,
    process::ExitStatus,
    sync::{Arc, atomic::AtomicBool},
};

use ff_io::runner::{RunEvent, Runner};
use tokio::{
    sync::mpsc::{Sender, channel},
    task::JoinHandle,
};
use tracing::{error, info};

use crate::prelude::*;
use crate::run_output::PipelineOutput;

/// Which phase a child process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Build,
    Run,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Build => write!(f, "Build"),
            Action::Run => write!(f, "Run"),
        }
    }
}

/// What happened to one child process.
#[derive(Debug)]
pub struct RunOutcome {
    /// `None` when the process never started or its status was lost.
    pub exit_status: Option<ExitStatus>,
    /// Set when the process could not be created.
    pub creation_error: Option<String>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_status.is_some_and(|status| status.success())
    }

    pub fn code(&self) -> Option<i32> {
        self.exit_status.and_then(|status| status.code())
    }
}

/// Spawns a runner on the tokio runtime.
pub fn spawn_runner(
    runner: Runner,
    tx: Sender<RunEvent>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Option<ExitStatus>> {
    tokio::spawn(async move { runner.run(tx, stop).await })
}

/// Runs one child process to completion, logging its lifecycle and
/// collecting captured output under `name`.
pub async fn drive(
    runner: Runner,
    action: Action,
    name: &str,
    output: &mut PipelineOutput,
    stop: Arc<AtomicBool>,
) -> Result<RunOutcome> {
    info!("{name} - {action}: {}", runner.get_full_command());
    let (tx, mut rx) = channel(10);
    let handle = spawn_runner(runner, tx, stop);

    let mut creation_error = None;
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::ProcessCreationFailed(err) => {
                error!("{name} - Failed to create {action} process - {err}");
                creation_error = Some(err);
            }
            RunEvent::ProcessCreated => info!("{name} - {action} started"),
            RunEvent::ProcessEnd(success) => {
                if success {
                    info!("{name} - {action} ended successfully");
                } else {
                    error!("{name} - {action} failed");
                }
            }
            RunEvent::ProcessNewOutputLine(line) => output.push(name, line),
        }
    }

    let exit_status = handle.await?;
    if let Some(status) = exit_status.filter(|status| !status.success()) {
        error!("{name} - {action} exit status {status}");
    }
    Ok(RunOutcome {
        exit_status,
        creation_error,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drive_collects_output_and_status() -> Result<()> {
        let mut output = PipelineOutput::quiet();
        let runner = Runner::new("sh", vec!["-c", "echo compiled; exit 4"]).capture();
        let outcome = drive(
            runner,
            Action::Build,
            "fftests",
            &mut output,
            Arc::new(AtomicBool::new(false)),
        )
        .await?;

        assert!(!outcome.success());
        assert_eq!(outcome.code(), Some(4));
        assert!(outcome.creation_error.is_none());
        assert_eq!(output.take("fftests").concat(), "compiled\n");
        Ok(())
    }

    #[tokio::test]
    async fn drive_reports_creation_failure() -> Result<()> {
        let mut output = PipelineOutput::quiet();
        let outcome = drive(
            Runner::new_without_args("/nonexistent/bin/fftests_test"),
            Action::Run,
            "fftests",
            &mut output,
            Arc::new(AtomicBool::new(false)),
        )
        .await?;

        assert!(outcome.exit_status.is_none());
        assert!(outcome.creation_error.is_some());
        Ok(())
    }
}
