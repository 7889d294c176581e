//! Scratch workspaces with a stand-in toolchain.
//!
//! The "compiler" is a shell script: it treats the entry source as a shell
//! script and copies it to the `-o` path, unless the source contains
//! `SYNTAX ERROR`, in which case it prints a diagnostic and exits 1. A source
//! containing `SLOW BUILD` keeps it busy until it is killed. Every
//! invocation is appended to `invocations.log` next to it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ff_config::{BuildDescriptor, BuildProfile, FfConfig, ToolchainConfig};
use tempfile::{TempDir, tempdir};

use crate::pipeline::{DescriptorReport, DescriptorState, ExecutionResult, PipelineReport};

/// Test configuration constants
pub mod config {
    /// Stand-in compiler script name, inside the workspace
    pub const FAKE_COMPILER: &str = "fakecc.sh";
    /// Log of the stand-in compiler's command lines
    pub const INVOCATIONS: &str = "invocations.log";
    /// File every test script appends its name to when executed
    pub const ORDER_LOG: &str = "order.log";
}

const FAKE_COMPILER_SCRIPT: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/invocations.log"
out=""
entry=""
while [ $# -gt 0 ]; do
    case "$1" in
        -o) out="$2"; shift 2 ;;
        -*) shift ;;
        *) if [ -z "$entry" ]; then entry="$1"; fi; shift ;;
    esac
done
if grep -q "SLOW BUILD" "$entry"; then
    exec sleep 30
fi
if grep -q "SYNTAX ERROR" "$entry"; then
    echo "$entry:1:1: error: expected ';'" >&2
    exit 1
fi
cp "$entry" "$out" && chmod +x "$out"
"#;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::in_dir(tempdir().unwrap())
    }

    /// A workspace below the current directory, so it can be named by a
    /// relative path.
    pub fn in_current_dir() -> Self {
        Self::in_dir(
            tempfile::Builder::new()
                .prefix("ffb-workspace")
                .tempdir_in(std::env::current_dir().unwrap())
                .unwrap(),
        )
    }

    fn in_dir(dir: TempDir) -> Self {
        fs::write(dir.path().join(config::FAKE_COMPILER), FAKE_COMPILER_SCRIPT).unwrap();
        Self { dir }
    }

    /// The workspace path relative to the current directory.
    pub fn relative_path(&self) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        self.path().strip_prefix(&cwd).unwrap().to_path_buf()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn toolchain(&self, profile: BuildProfile) -> ToolchainConfig {
        ToolchainConfig {
            compiler: String::from("sh"),
            compiler_args: vec![
                self.path()
                    .join(config::FAKE_COMPILER)
                    .to_string_lossy()
                    .into_owned(),
            ],
            include_dirs: Vec::new(),
            profile,
        }
    }

    pub fn config(&self, tests: Vec<BuildDescriptor>) -> FfConfig {
        let mut config = FfConfig::builtin(self.path());
        config.toolchain = self.toolchain(BuildProfile::Debug);
        config.tests = tests;
        config.validate().unwrap();
        config
    }

    /// Writes `tests/<name>.sh` and returns a descriptor building it into
    /// `bin/<name>`.
    pub fn test(&self, name: &str, script: &str) -> BuildDescriptor {
        let entry = format!("tests/{name}.sh");
        self.write(&entry, script);
        BuildDescriptor::new(name, entry, format!("bin/{name}"))
    }

    /// Writes `ffb.toml` using the stand-in toolchain and `tests`, and
    /// returns its path.
    pub fn write_config(&self, tests: &[BuildDescriptor]) -> PathBuf {
        let compiler = &self.toolchain(BuildProfile::Debug).compiler_args[0];
        let mut toml = format!("[global]\ncompiler = \"sh\"\ncompiler_args = [{compiler:?}]\n");
        for test in tests {
            toml.push_str(&format!(
                "\n[[tests]]\nname = {:?}\nentry = {:?}\noutput = {:?}\n",
                test.name,
                test.entry.display().to_string(),
                test.output.display().to_string()
            ));
        }
        let path = self.path().join("ffb.toml");
        fs::write(&path, toml).unwrap();
        path
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn artifact(&self, name: &str) -> PathBuf {
        self.path().join("bin").join(name)
    }

    pub fn invocations(&self) -> Vec<String> {
        read_lines(&self.path().join(config::INVOCATIONS))
    }

    pub fn execution_order(&self) -> Vec<String> {
        read_lines(&self.path().join(config::ORDER_LOG))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|content| content.lines().map(String::from).collect())
        .unwrap_or_default()
}

/// A test program that records itself in the order log and exits `code`.
pub fn test_script(name: &str, code: i32) -> String {
    let verdict = if code == 0 { "passed" } else { "FAILED" };
    format!(
        "#!/bin/sh\necho {name} >> {}\necho \"{name} {verdict}\"\nexit {code}\n",
        config::ORDER_LOG
    )
}

/// A source the stand-in compiler rejects.
pub fn broken_script(name: &str) -> String {
    format!("#!/bin/sh\n# SYNTAX ERROR\necho {name} >> {}\n", config::ORDER_LOG)
}

/// A source the stand-in compiler hangs on.
pub fn slow_script(name: &str) -> String {
    format!("#!/bin/sh\n# SLOW BUILD\necho {name} >> {}\n", config::ORDER_LOG)
}

pub fn entry<'a>(report: &'a PipelineReport, name: &str) -> &'a DescriptorReport {
    report
        .entries
        .iter()
        .find(|entry| entry.name == name)
        .unwrap_or_else(|| panic!("no report entry for {name}"))
}

pub fn executed(report: &PipelineReport, name: &str) -> ExecutionResult {
    match &entry(report, name).state {
        DescriptorState::Executed(result) => result.clone(),
        other => panic!("{name} was not executed: {other:?}"),
    }
}
