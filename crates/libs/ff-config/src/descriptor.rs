//! Build descriptor types.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// One test program: what to compile, how, and where the binary goes.
///
/// Usually loaded from the `[[tests]]` tables of a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDescriptor {
    /// Test name. Must be unique within a configuration.
    pub name: String,
    /// Source file containing the test program's `main`.
    pub entry: PathBuf,
    /// Library modules compiled alongside the entry. Literal paths or
    /// wildcard patterns such as `src/ff/*.cpp`.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Preprocessor macros, passed as `-D<NAME>`.
    #[serde(default)]
    pub defines: Vec<String>,
    /// Extra compiler flags, passed verbatim.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Where the test binary is written. Overwritten on every build.
    pub output: PathBuf,
}

impl BuildDescriptor {
    pub fn new(
        name: impl Into<String>,
        entry: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            sources: Vec::new(),
            defines: Vec::new(),
            flags: Vec::new(),
            output: output.into(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn with_defines(mut self, defines: Vec<impl Into<String>>) -> Self {
        self.defines = defines.into_iter().map(|d| d.into()).collect();
        self
    }

    pub fn with_flags(mut self, flags: Vec<impl Into<String>>) -> Self {
        self.flags = flags.into_iter().map(|f| f.into()).collect();
        self
    }

    /// Artifact location resolved against `base_dir`.
    pub fn output_path(&self, base_dir: &Path) -> PathBuf {
        normalize(&base_dir.join(&self.output))
    }

    /// Entry source resolved against `base_dir`.
    pub fn entry_path(&self, base_dir: &Path) -> PathBuf {
        normalize(&base_dir.join(&self.entry))
    }

    pub(crate) fn check(&self) -> Result<()> {
        let empty = |field| Error::EmptyField {
            descriptor: self.name.clone(),
            field,
        };
        if self.name.trim().is_empty() {
            return Err(empty("name"));
        }
        if self.entry.as_os_str().is_empty() {
            return Err(empty("entry"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(empty("output"));
        }
        Ok(())
    }
}

impl fmt::Display for BuildDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.name,
            self.entry.display(),
            self.output.display()
        )
    }
}

/// Lexically drop `.` components and fold `..` where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) || !out.pop()
                {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_is_normalized() {
        let descriptor = BuildDescriptor::new("t", "t.cpp", "./bin/../bin/t");
        assert_eq!(
            descriptor.output_path(Path::new("/work")),
            PathBuf::from("/work/bin/t")
        );
    }

    #[test]
    fn normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let descriptor = BuildDescriptor::new("t", "", "bin/t");
        assert!(matches!(
            descriptor.check(),
            Err(Error::EmptyField { field: "entry", .. })
        ));
        assert!(BuildDescriptor::new(" ", "t.cpp", "bin/t").check().is_err());
        assert!(BuildDescriptor::new("t", "t.cpp", "bin/t").check().is_ok());
    }
}
