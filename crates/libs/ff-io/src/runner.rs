//! High-level process runner with event handling.

use std::{
    path::PathBuf,
    process::ExitStatus,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::process::{
    OutputMode, ProcessStatus, capture_exit_status, get_process_status, spawn_process, stop_child,
};

/// Events emitted during process execution.
#[derive(Debug, PartialEq)]
pub enum RunEvent {
    /// Process creation failed with error message.
    ProcessCreationFailed(String),
    /// Process was successfully created.
    ProcessCreated,
    /// Process ended (true = success, false = failure).
    ProcessEnd(bool),
    /// New output from the process. Only emitted in [`OutputMode::Capture`].
    ProcessNewOutputLine(String),
}

/// High-level process runner with event-driven output handling.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Command to execute.
    command: String,
    /// Command line arguments.
    args: Vec<String>,
    /// Directory the process starts in.
    working_dir: Option<PathBuf>,
    /// Where stdout/stderr go.
    output: OutputMode,
}

impl Runner {
    /// Create a new runner with command and arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ff_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
            working_dir: None,
            output: OutputMode::default(),
        }
    }

    /// Create a new runner with just a command (no arguments).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ff_io::runner::Runner;
    ///
    /// let runner = Runner::new_without_args("./bin/fftests_test");
    /// ```
    pub fn new_without_args(command: impl Into<String>) -> Self {
        Self::new(command, Vec::<String>::new())
    }

    /// Start the process in `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Shorthand for `with_output(OutputMode::Capture)`.
    pub fn capture(self) -> Self {
        self.with_output(OutputMode::Capture)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the full command string with arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ff_io::runner::Runner;
    ///
    /// let runner = Runner::new("g++", vec!["main.cpp", "-o", "main"]);
    /// assert_eq!(runner.get_full_command(), "g++ main.cpp -o main");
    /// assert_eq!(Runner::new_without_args("pwd").get_full_command(), "pwd");
    /// ```
    pub fn get_full_command(&self) -> String {
        if self.args.is_empty() {
            return self.command.clone();
        }
        format!("{} {}", &self.command, &self.args.join(" "))
    }

    async fn read_stream<T: AsyncRead + Unpin>(tx: Sender<RunEvent>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buffer[..n]);
                    if tx
                        .send(RunEvent::ProcessNewOutputLine(data.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn launch_stream_reader<T>(tx: Sender<RunEvent>, stream: Option<T>) -> Option<JoinHandle<()>>
    where
        T: AsyncRead + Unpin + Send + 'static,
    {
        stream.map(|stream| tokio::spawn(Runner::read_stream(tx, stream)))
    }

    /// Run the process with event monitoring.
    ///
    /// Starts the process and waits for it, sending events via the provided
    /// channel. In capture mode stdout and stderr are read until EOF and
    /// forwarded as [`RunEvent::ProcessNewOutputLine`]. Returns `None` when the
    /// process could not be created or its status could not be collected.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ff_io::runner::{RunEvent, Runner};
    /// use std::sync::{Arc, atomic::AtomicBool};
    /// use tokio::sync::mpsc;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let runner = Runner::new("echo", vec!["Hello"]);
    ///     let (tx, _rx) = mpsc::channel(10);
    ///     let should_stop = Arc::new(AtomicBool::new(false));
    ///
    ///     let exit_status = runner.run(tx, should_stop).await;
    ///     assert!(exit_status.unwrap().success());
    /// }
    /// ```
    pub async fn run(&self, tx: Sender<RunEvent>, should_stop: Arc<AtomicBool>) -> Option<ExitStatus> {
        debug!("Spawning `{}`", self.get_full_command());
        let mut process = match spawn_process(
            &self.command,
            &self.args,
            self.working_dir.as_deref(),
            self.output,
        ) {
            Ok(process) => process,
            Err(err) => {
                let _ = tx
                    .send(RunEvent::ProcessCreationFailed(err.to_string()))
                    .await;
                return None;
            }
        };

        let _ = tx.send(RunEvent::ProcessCreated).await;

        let stdout_task = Runner::launch_stream_reader(tx.clone(), process.stdout.take());
        let stderr_task = Runner::launch_stream_reader(tx.clone(), process.stderr.take());

        // Loop until we either get asked to stop or the process ends
        let exit_status = loop {
            if should_stop.load(Ordering::Relaxed) {
                warn!("Stopping `{}`", self.command);
                if stop_child(&mut process).await.is_err() {
                    break None;
                }
                break capture_exit_status(&mut process).await.ok();
            }
            match get_process_status(&mut process).await {
                Err(_) => break None,
                Ok(ProcessStatus::Done(status)) => break Some(status),
                Ok(ProcessStatus::Running) => {}
            };
        };

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            let _ = task.await;
        }

        let success = exit_status.is_some_and(|status| status.success());
        let _ = tx.send(RunEvent::ProcessEnd(success)).await;
        exit_status
    }
}
