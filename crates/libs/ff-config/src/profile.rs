//! Debug/release build configuration.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Build configuration propagated into every compiler invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    /// Full debug symbols, no optimisation.
    #[default]
    Debug,
    /// Aggressive optimisation, no debug symbols.
    Release,
}

impl BuildProfile {
    /// Compiler flags contributed by the profile.
    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            BuildProfile::Debug => &["-g3"],
            BuildProfile::Release => &["-Ofast"],
        }
    }
}

impl From<BuildProfile> for &'static str {
    fn from(value: BuildProfile) -> Self {
        match value {
            BuildProfile::Debug => "debug",
            BuildProfile::Release => "release",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = (*self).into();
        write!(f, "{name}")
    }
}

impl FromStr for BuildProfile {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildProfile::Debug),
            "release" => Ok(BuildProfile::Release),
            _ => Err(Error::InvalidProfile(String::from(value))),
        }
    }
}
