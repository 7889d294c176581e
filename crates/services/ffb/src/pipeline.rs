//! Build-then-execute pipeline.
//!
//! Every descriptor moves through its own state machine:
//!
//! ```text
//! Pending -> BuildFailed ------------------> Skipped(build failed)
//!         -> Built ------> Executed(status)
//!                    \---> Skipped(interrupted)
//!         -> Skipped(interrupted)
//! ```
//!
//! Both phases are fail-soft. All builds are attempted before any test runs,
//! and every successfully built test runs, in declaration order, whatever
//! the outcome of the ones before it. A test whose build failed is never
//! launched, so a stale binary from an earlier run cannot pass in its place.
//! Builds run one at a time: each toolchain invocation is expected to keep
//! the machine busy on its own.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use ff_config::{BuildDescriptor, BuildProfile, FfConfig};
use ff_io::{OutputMode, Runner};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::{Action, drive};
use crate::compiler::{BuildResult, Compiler};
use crate::prelude::*;
use crate::run_output::PipelineOutput;

/// Outcome of running one test binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub artifact: PathBuf,
    /// Exit code. `None` when it could not be launched or died from a signal.
    pub status: Option<i32>,
    pub success: bool,
}

/// Why a descriptor was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BuildFailed,
    ArtifactMissing,
    Interrupted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BuildFailed => write!(f, "build failed"),
            SkipReason::ArtifactMissing => write!(f, "artifact missing"),
            SkipReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DescriptorState {
    Pending,
    BuildFailed(BuildResult),
    Built(BuildResult),
    Executed(ExecutionResult),
    Skipped { reason: SkipReason },
}

/// Everything known about one descriptor after a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorReport {
    pub name: String,
    pub output: PathBuf,
    pub state: DescriptorState,
    /// Kept once the state has moved past the build phase.
    pub build: Option<BuildResult>,
    /// Captured compiler and test output, empty unless capturing.
    pub logs: Vec<String>,
}

impl DescriptorReport {
    fn pending(descriptor: &BuildDescriptor, base_dir: &Path) -> Self {
        Self {
            name: descriptor.name.clone(),
            output: descriptor.output_path(base_dir),
            state: DescriptorState::Pending,
            build: None,
            logs: Vec::new(),
        }
    }

    fn skip(&mut self, reason: SkipReason) {
        self.state = DescriptorState::Skipped { reason };
    }

    fn build_column(&self) -> String {
        let build = match (&self.state, &self.build) {
            (DescriptorState::BuildFailed(result), _) | (DescriptorState::Built(result), _) => {
                Some(result)
            }
            (_, build) => build.as_ref(),
        };
        match build {
            Some(result) if result.success => String::from("ok"),
            Some(result) => match result.status {
                Some(code) => format!("failed ({code})"),
                None => String::from("failed"),
            },
            None => String::from("-"),
        }
    }

    fn run_column(&self) -> String {
        match &self.state {
            DescriptorState::Executed(result) if result.success => String::from("passed"),
            DescriptorState::Executed(result) => match result.status {
                Some(code) => format!("failed ({code})"),
                None => String::from("failed to launch"),
            },
            DescriptorState::Skipped { reason } => format!("skipped: {reason}"),
            DescriptorState::Pending | DescriptorState::BuildFailed(_) | DescriptorState::Built(_) => {
                String::from("-")
            }
        }
    }
}

/// Aggregated result of a pipeline command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub profile: BuildProfile,
    /// True when every descriptor reached the command's goal.
    pub success: bool,
    /// One entry per descriptor, in declaration order.
    pub entries: Vec<DescriptorReport>,
}

impl PipelineReport {
    pub fn write_summary<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let width = self
            .entries
            .iter()
            .map(|entry| entry.name.len())
            .max()
            .unwrap_or(0)
            .max(4);
        writeln!(writer, "{:<width$}  {:<12}  run", "test", "build")?;
        for entry in self.entries.iter() {
            writeln!(
                writer,
                "{:<width$}  {:<12}  {}",
                entry.name,
                entry.build_column(),
                entry.run_column()
            )?;
        }
        let verdict = if self.success { "ok" } else { "FAILED" };
        writeln!(writer, "result: {verdict} ({} profile)", self.profile)
    }
}

/// Drives the compiler and the produced test binaries.
pub struct Pipeline {
    compiler: Compiler,
    mode: OutputMode,
    stop: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: &FfConfig, mode: OutputMode, stop: Arc<AtomicBool>) -> Self {
        Self {
            compiler: Compiler::from_config(config),
            mode,
            stop,
        }
    }

    fn base_dir(&self) -> &Path {
        self.compiler.base_dir()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn pending(&self, descriptors: &[&BuildDescriptor]) -> Vec<DescriptorReport> {
        descriptors
            .iter()
            .map(|descriptor| DescriptorReport::pending(descriptor, self.base_dir()))
            .collect()
    }

    fn finish(
        &self,
        mut entries: Vec<DescriptorReport>,
        output: &mut PipelineOutput,
        goal: fn(&DescriptorState) -> bool,
    ) -> PipelineReport {
        for entry in entries.iter_mut() {
            entry.logs = output.take(&entry.name);
        }
        PipelineReport {
            profile: self.compiler.profile(),
            success: entries.iter().all(|entry| goal(&entry.state)),
            entries,
        }
    }

    /// Builds every descriptor, then runs every test that built.
    pub async fn run_all(
        &self,
        descriptors: &[&BuildDescriptor],
        output: &mut PipelineOutput,
    ) -> Result<PipelineReport> {
        let mut entries = self.pending(descriptors);

        println!("Building...");
        self.build_phase(descriptors, &mut entries, output).await?;
        println!("Building complete.");

        println!("Running tests...");
        for entry in entries.iter_mut() {
            match &entry.state {
                DescriptorState::Built(result) => entry.build = Some(result.clone()),
                DescriptorState::BuildFailed(result) => {
                    warn!("{} - Not running, build failed", entry.name);
                    entry.build = Some(result.clone());
                    entry.skip(SkipReason::BuildFailed);
                }
                _ => {}
            }
        }
        self.execute_phase(&mut entries, output).await?;

        Ok(self.finish(entries, output, |state| {
            matches!(state, DescriptorState::Executed(result) if result.success)
        }))
    }

    /// Build phase only.
    pub async fn build_all(
        &self,
        descriptors: &[&BuildDescriptor],
        output: &mut PipelineOutput,
    ) -> Result<PipelineReport> {
        let mut entries = self.pending(descriptors);

        println!("Building...");
        self.build_phase(descriptors, &mut entries, output).await?;
        println!("Building complete.");

        Ok(self.finish(entries, output, |state| {
            matches!(state, DescriptorState::Built(_))
        }))
    }

    /// Execute phase only, against whatever artifacts are on disk.
    pub async fn execute_all(
        &self,
        descriptors: &[&BuildDescriptor],
        output: &mut PipelineOutput,
    ) -> Result<PipelineReport> {
        let mut entries = self.pending(descriptors);

        println!("Running tests...");
        for entry in entries.iter_mut() {
            if !entry.output.is_file() {
                warn!("{} - No artifact at {:?}", entry.name, entry.output);
                entry.skip(SkipReason::ArtifactMissing);
            }
        }
        self.execute_phase(&mut entries, output).await?;

        Ok(self.finish(entries, output, |state| {
            matches!(state, DescriptorState::Executed(result) if result.success)
        }))
    }

    async fn build_phase(
        &self,
        descriptors: &[&BuildDescriptor],
        entries: &mut [DescriptorReport],
        output: &mut PipelineOutput,
    ) -> Result<()> {
        let count = descriptors.len();
        for (idx, (descriptor, entry)) in descriptors.iter().zip(entries.iter_mut()).enumerate() {
            if self.stopped() {
                entry.skip(SkipReason::Interrupted);
                continue;
            }
            info!("Test {}/{}: {}", idx + 1, count, descriptor.name);
            let result = self
                .compiler
                .compile(descriptor, self.mode, output, Arc::clone(&self.stop))
                .await?;
            entry.state = if result.success {
                DescriptorState::Built(result)
            } else if self.stopped() {
                warn!("{} - Build interrupted", descriptor.name);
                entry.build = Some(result);
                DescriptorState::Skipped {
                    reason: SkipReason::Interrupted,
                }
            } else {
                DescriptorState::BuildFailed(result)
            };
        }
        Ok(())
    }

    /// Runs every entry that has not been skipped, in order.
    async fn execute_phase(
        &self,
        entries: &mut [DescriptorReport],
        output: &mut PipelineOutput,
    ) -> Result<()> {
        for entry in entries.iter_mut() {
            if matches!(entry.state, DescriptorState::Skipped { .. }) {
                continue;
            }
            if self.stopped() {
                entry.skip(SkipReason::Interrupted);
                continue;
            }
            let result = self.execute(&entry.name, &entry.output, output).await?;
            entry.state = DescriptorState::Executed(result);
        }
        Ok(())
    }

    /// Runs one test binary with no arguments from the base directory.
    pub async fn execute(
        &self,
        name: &str,
        artifact: &Path,
        output: &mut PipelineOutput,
    ) -> Result<ExecutionResult> {
        let runner = Runner::new_without_args(artifact.to_string_lossy())
            .with_working_dir(self.base_dir())
            .with_output(self.mode);
        let outcome = drive(runner, Action::Run, name, output, Arc::clone(&self.stop)).await?;
        Ok(ExecutionResult {
            artifact: artifact.to_path_buf(),
            status: outcome.code(),
            success: outcome.success(),
        })
    }
}
