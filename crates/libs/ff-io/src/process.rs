//! Low-level async process management utilities.

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::process::{Child, Command};

/// Errors that can occur during process operations.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    /// Failed to wait for child process.
    #[error("Failed to wait for child process: {0}")]
    WaitChildFail(io::Error),
    /// Failed to spawn the process.
    #[error("Failed to spawn process: {0}")]
    SpawnProcessFail(io::Error),
    /// Process was terminated.
    #[error("Process was terminated")]
    Quit,
}

/// Where the standard output and error of a child process go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// The child writes straight to the parent's stdout/stderr.
    #[default]
    Inherit,
    /// The child's stdout/stderr are piped back to the parent.
    Capture,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture => Stdio::piped(),
        }
    }
}

/// Current status of a running process.
pub enum ProcessStatus {
    /// Process has completed with exit status.
    Done(ExitStatus),
    /// Process is still running.
    Running,
}

/// Spawn a new async process.
///
/// Stdin is always closed: neither the toolchain nor the test binaries read
/// input, and a child blocked on stdin would stall the pipeline forever.
///
/// # Arguments
///
/// * `cmd` - Command to execute
/// * `args` - Command line arguments
/// * `working_dir` - Directory the child starts in, `None` keeps the parent's
/// * `mode` - Whether stdout/stderr are inherited or piped
///
/// # Examples
///
/// ```rust
/// use ff_io::process::{OutputMode, spawn_process};
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("echo", &["Hello"], None, OutputMode::Capture).unwrap();
///     let output = child.stdout.take().unwrap();
/// }
/// ```
pub fn spawn_process<S: AsRef<OsStr>>(
    cmd: impl AsRef<OsStr>,
    args: &[S],
    working_dir: Option<&Path>,
    mode: OutputMode,
) -> Result<Child, io::Error> {
    let mut command = Command::new(cmd);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(mode.stdio())
        .stderr(mode.stdio())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }
    command.spawn()
}

/// Asynchronously check process status without blocking.
///
/// Includes a small async sleep when the process is still running to prevent
/// excessive CPU usage when called in a loop.
///
/// # Examples
///
/// ```rust
/// use ff_io::process::{OutputMode, ProcessStatus, get_process_status, spawn_process};
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("sleep", &["1"], None, OutputMode::Inherit).unwrap();
///
///     loop {
///         match get_process_status(&mut child).await.unwrap() {
///             ProcessStatus::Done(exit_status) => {
///                 println!("Process finished with: {:?}", exit_status);
///                 break;
///             }
///             ProcessStatus::Running => {
///                 println!("Still running...");
///             }
///         }
///     }
/// }
/// ```
pub async fn get_process_status(child: &mut Child) -> Result<ProcessStatus, ProcessError> {
    match child.try_wait() {
        Ok(Some(exit_status)) => Ok(ProcessStatus::Done(exit_status)),
        Ok(None) => {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(ProcessStatus::Running)
        }
        Err(err) => Err(ProcessError::WaitChildFail(err)),
    }
}

/// Kill a child process and reap it.
pub async fn stop_child(child: &mut Child) -> Result<(), io::Error> {
    child.kill().await
}

/// Wait for the child process to complete and return its exit status.
pub async fn capture_exit_status(child: &mut Child) -> Result<ExitStatus, io::Error> {
    child.wait().await
}

/// Asynchronously wait for a child process with cancellation support.
///
/// Waits for the child process to complete while periodically checking
/// if it should be cancelled via the atomic boolean flag. A cancelled child
/// is killed before [`ProcessError::Quit`] is returned.
///
/// # Examples
///
/// ```rust
/// use ff_io::process::{OutputMode, spawn_process, wait_child};
/// use std::sync::{Arc, atomic::AtomicBool};
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("true", &[] as &[&str], None, OutputMode::Inherit).unwrap();
///     let should_stop = Arc::new(AtomicBool::new(false));
///
///     let exit_status = wait_child(&mut child, should_stop).await.unwrap();
///     assert!(exit_status.success());
/// }
/// ```
pub async fn wait_child(
    child: &mut Child,
    should_stop: Arc<AtomicBool>,
) -> Result<ExitStatus, ProcessError> {
    loop {
        if should_stop.load(Ordering::Relaxed) {
            let _ = stop_child(child).await;
            return Err(ProcessError::Quit);
        }
        match get_process_status(child).await? {
            ProcessStatus::Done(exit_status) => return Ok(exit_status),
            ProcessStatus::Running => {}
        }
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;

    #[tokio::test]
    async fn wait_child_reports_exit_code() {
        let mut child =
            spawn_process("sh", &["-c", "exit 3"], None, OutputMode::Inherit).unwrap();
        let status = wait_child(&mut child, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn wait_child_quits_when_asked_to_stop() {
        let mut child = spawn_process("sleep", &["30"], None, OutputMode::Inherit).unwrap();
        let stop = Arc::new(AtomicBool::new(true));
        let result = tokio::time::timeout(Duration::from_secs(5), wait_child(&mut child, stop))
            .await
            .expect("wait_child did not honour the stop flag");
        assert!(matches!(result, Err(ProcessError::Quit)));
    }

    #[tokio::test]
    async fn spawn_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let mut child = spawn_process(
            "sh",
            &["-c", "test -f marker"],
            Some(dir.path()),
            OutputMode::Inherit,
        )
        .unwrap();
        assert!(capture_exit_status(&mut child).await.unwrap().success());
    }

    #[tokio::test]
    async fn spawn_missing_program_fails() {
        let result = spawn_process(
            "./definitely-not-a-program",
            &[] as &[&str],
            None,
            OutputMode::Inherit,
        );
        assert!(matches!(result, Err(err) if err.kind() == io::ErrorKind::NotFound));
    }
}
