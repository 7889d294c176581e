//! Compiler invocation.
//!
//! Turns one build descriptor into one toolchain command line and runs it.
//! A compile failure is not an `Err`: it comes back as a [`BuildResult`]
//! whose `success` is false, so the pipeline can keep going.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, atomic::AtomicBool},
};

use ff_config::{BuildDescriptor, BuildProfile, FfConfig, ToolchainConfig};
use ff_io::{OutputMode, Runner};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::common::{Action, RunOutcome, drive};
use crate::prelude::*;
use crate::run_output::PipelineOutput;
use crate::sources::resolve_sources;

/// Outcome of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Compiler exit code. `None` when it never ran or died from a signal.
    pub status: Option<i32>,
    pub success: bool,
    /// Why the build failed before or outside the toolchain.
    pub reason: Option<String>,
}

impl BuildResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            success: false,
            reason: Some(reason.into()),
        }
    }
}

impl From<RunOutcome> for BuildResult {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            status: outcome.code(),
            success: outcome.success(),
            reason: outcome.creation_error,
        }
    }
}

/// The C++ toolchain, rooted at an explicit base directory.
#[derive(Debug, Clone)]
pub struct Compiler {
    toolchain: ToolchainConfig,
    base_dir: PathBuf,
}

impl Compiler {
    pub fn new(toolchain: ToolchainConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            base_dir: base_dir.into(),
        }
    }

    pub fn from_config(config: &FfConfig) -> Self {
        Self::new(config.toolchain.clone(), config.base_dir.clone())
    }

    pub fn profile(&self) -> BuildProfile {
        self.toolchain.profile
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn absolute(&self, path: &Path) -> String {
        self.base_dir.join(path).to_string_lossy().into_owned()
    }

    /// A bare program name is looked up in `PATH`, anything with a separator
    /// is taken relative to the base directory.
    fn program(&self) -> String {
        let compiler = &self.toolchain.compiler;
        if Path::new(compiler).components().count() > 1 {
            self.absolute(Path::new(compiler))
        } else {
            compiler.clone()
        }
    }

    /// Full argument list for `descriptor`, given its resolved sources.
    pub fn command_args(&self, descriptor: &BuildDescriptor, sources: &[PathBuf]) -> Vec<String> {
        let entry = descriptor.entry_path(&self.base_dir);
        let mut args = self.toolchain.compiler_args.clone();
        args.push(entry.to_string_lossy().into_owned());
        args.extend(
            sources
                .iter()
                .filter(|source| **source != entry)
                .map(|source| source.to_string_lossy().into_owned()),
        );
        args.extend(
            self.toolchain
                .include_dirs
                .iter()
                .map(|dir| format!("-I{}", self.absolute(dir))),
        );
        args.extend(descriptor.defines.iter().map(|define| format!("-D{define}")));
        args.extend(self.profile().flags().iter().map(|flag| flag.to_string()));
        args.extend(descriptor.flags.iter().cloned());
        args.push(String::from("-o"));
        args.push(
            descriptor
                .output_path(&self.base_dir)
                .to_string_lossy()
                .into_owned(),
        );
        args
    }

    /// Resolves the descriptor's sources and builds the toolchain runner.
    pub fn runner(&self, descriptor: &BuildDescriptor) -> Result<Runner> {
        let sources = resolve_sources(&self.base_dir, &descriptor.sources)?;
        Ok(Runner::new(self.program(), self.command_args(descriptor, &sources))
            .with_working_dir(&self.base_dir))
    }

    /// Compiles `descriptor`, waiting for the toolchain to exit.
    pub async fn compile(
        &self,
        descriptor: &BuildDescriptor,
        mode: OutputMode,
        output: &mut PipelineOutput,
        stop: Arc<AtomicBool>,
    ) -> Result<BuildResult> {
        let runner = match self.runner(descriptor) {
            Ok(runner) => runner.with_output(mode),
            Err(err) => {
                error!("{} - {err}", descriptor.name);
                return Ok(BuildResult::failed(err.to_string()));
            }
        };

        let artifact = descriptor.output_path(&self.base_dir);
        if let Some(parent) = artifact.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                error!("{} - Cannot create {:?} - {err}", descriptor.name, parent);
                return Ok(BuildResult::failed(format!(
                    "cannot create {}: {err}",
                    parent.display()
                )));
            }
        }

        let outcome = drive(runner, Action::Build, &descriptor.name, output, stop).await?;
        Ok(BuildResult::from(outcome))
    }
}
