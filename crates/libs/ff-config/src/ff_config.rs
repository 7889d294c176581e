//! Core configuration types for the ff test pipeline.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    descriptor::{BuildDescriptor, normalize},
    prelude::*,
    profile::BuildProfile,
};

fn default_version() -> String {
    String::from("1.0.0")
}

fn default_compiler() -> String {
    String::from("g++")
}

/// How the C++ toolchain is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Compiler program, looked up in `PATH` when not a path.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Arguments placed before anything else on the compiler command line.
    #[serde(default)]
    pub compiler_args: Vec<String>,
    /// Header search directories, passed as `-I<dir>`.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub profile: BuildProfile,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            compiler_args: Vec::new(),
            include_dirs: Vec::new(),
            profile: BuildProfile::default(),
        }
    }
}

/// Global configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfGlobalConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Root for every relative path. Relative to the configuration file.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub toolchain: ToolchainConfig,
}

impl Default for FfGlobalConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            base_dir: None,
            toolchain: ToolchainConfig::default(),
        }
    }
}

/// User-provided configuration from TOML files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfUserConfig {
    /// Global settings.
    #[serde(default)]
    pub global: FfGlobalConfig,
    /// Test descriptors, in execution order.
    pub tests: Vec<BuildDescriptor>,
}

/// Validated configuration with an absolute base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfConfig {
    /// Configuration version.
    pub version: String,
    /// Root for every relative source, include and output path.
    pub base_dir: PathBuf,
    pub toolchain: ToolchainConfig,
    /// Test descriptors, in declaration order.
    pub tests: Vec<BuildDescriptor>,
}

impl FfUserConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }
    /// Parse configuration from TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }
}

impl FfConfig {
    /// Validate a user configuration.
    ///
    /// `config_dir` is the directory the configuration was loaded from; a
    /// relative `base_dir` is resolved against it, and it is the base
    /// directory itself when none is given. A relative `config_dir` is taken
    /// from the current directory.
    pub fn from_user_config(config: FfUserConfig, config_dir: &Path) -> Result<Self> {
        let config_dir = std::path::absolute(config_dir)?;
        let base_dir = match config.global.base_dir {
            Some(dir) => normalize(&config_dir.join(dir)),
            None => normalize(&config_dir),
        };
        let resolved = Self {
            version: config.global.version,
            base_dir,
            toolchain: config.global.toolchain,
            tests: config.tests,
        };
        resolved.validate()?;
        debug!(
            "Loaded {} tests rooted at {:?}",
            resolved.tests.len(),
            resolved.base_dir
        );
        Ok(resolved)
    }

    /// Load and validate a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let user_config = FfUserConfig::from_file(file_path)?;
        let config_dir = match file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        info!("Loaded configuration {:?}", file_path);
        Self::from_user_config(user_config, &config_dir)
    }

    /// The feed-forward library's own test table.
    ///
    /// `backprop` needs the `NN_DEBUG` macro to reach the network internals;
    /// both tests link every module under `src/ff`.
    pub fn builtin(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: default_version(),
            base_dir: base_dir.into(),
            toolchain: ToolchainConfig::default(),
            tests: vec![
                BuildDescriptor::new(
                    "backprop",
                    "tests/fftests/backprop.cpp",
                    "bin/backprop_tests",
                )
                .with_sources(vec!["src/ff/*.cpp"])
                .with_defines(vec!["NN_DEBUG"]),
                BuildDescriptor::new("fftests", "tests/fftests/fftests.cpp", "bin/fftests_test")
                    .with_sources(vec!["src/ff/*.cpp"]),
            ],
        }
    }

    /// Check names are unique and no two tests write the same artifact.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut outputs: HashMap<PathBuf, &str> = HashMap::new();
        for descriptor in self.tests.iter() {
            descriptor.check()?;
            if !names.insert(descriptor.name.as_str()) {
                return Err(Error::DuplicateName(descriptor.name.clone()));
            }
            let output = descriptor.output_path(&self.base_dir);
            if let Some(first) = outputs.get(&output) {
                return Err(Error::OutputCollision {
                    first: first.to_string(),
                    second: descriptor.name.clone(),
                    output,
                });
            }
            outputs.insert(output, &descriptor.name);
        }
        Ok(())
    }

    /// Pick tests by name, keeping declaration order. An empty filter
    /// selects everything.
    pub fn select(&self, names: &[String]) -> Result<Vec<&BuildDescriptor>> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.tests.iter().any(|t| &t.name == *name))
        {
            return Err(Error::UnknownDescriptor(unknown.clone()));
        }
        Ok(self
            .tests
            .iter()
            .filter(|t| names.is_empty() || names.contains(&t.name))
            .collect())
    }
}
