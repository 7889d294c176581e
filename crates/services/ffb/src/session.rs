//! Resolved settings for one `ffb` invocation.
//!
//! Combines the configuration file (or the built-in test table) with the
//! command-line overrides. Precedence is CLI flag, then configuration file,
//! then built-in default.

use std::{
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
};

use ff_config::{BuildProfile, FfConfig, descriptor::normalize};
use ff_io::OutputMode;
use tracing::info;

use crate::pipeline::Pipeline;
use crate::prelude::*;

/// Command-line overrides applied on top of the configuration.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub profile: Option<BuildProfile>,
    pub compiler: Option<String>,
    pub capture: bool,
}

pub struct Session {
    /// The validated configuration.
    pub config: FfConfig,
    /// Path to the configuration file, if any.
    pub config_path: Option<PathBuf>,
    pub mode: OutputMode,
    /// Raised on Ctrl-C; kills the running child and skips the rest.
    pub stop: Arc<AtomicBool>,
}

impl Session {
    pub fn create(
        config_path: Option<PathBuf>,
        overrides: Overrides,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut config = match &config_path {
            Some(path) => FfConfig::from_file(path)?,
            None => {
                info!("No configuration given, using the built-in test table");
                FfConfig::builtin(cwd.clone())
            }
        };

        if let Some(dir) = overrides.base_dir {
            config.base_dir = normalize(&cwd.join(dir));
        }
        if let Some(profile) = overrides.profile {
            config.toolchain.profile = profile;
        }
        if let Some(compiler) = overrides.compiler {
            config.toolchain.compiler = compiler;
        }
        config.validate()?;

        let mode = if overrides.capture {
            OutputMode::Capture
        } else {
            OutputMode::Inherit
        };
        Ok(Self {
            config,
            config_path,
            mode,
            stop,
        })
    }

    pub fn capture(&mut self) {
        self.mode = OutputMode::Capture;
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(&self.config, self.mode, Arc::clone(&self.stop))
    }
}
