//! Process execution for the ff test pipeline.
//!
//! Provides utilities for spawning, awaiting and cancelling the external
//! programs the pipeline drives (the C++ toolchain and the produced test
//! binaries), with either inherited or captured output.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ff_io::runner::{RunEvent, Runner};
//! use std::sync::{Arc, atomic::AtomicBool};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new("echo", vec!["Hello, World!"]).capture();
//!     let (tx, mut rx) = mpsc::channel(10);
//!     let should_stop = Arc::new(AtomicBool::new(false));
//!
//!     let handle = tokio::spawn(async move { runner.run(tx, should_stop).await });
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             RunEvent::ProcessNewOutputLine(line) => print!("{line}"),
//!             RunEvent::ProcessEnd(success) => println!("Process ended: {success}"),
//!             _ => {}
//!         }
//!     }
//!     let _exit_status = handle.await;
//! }
//! ```

pub mod process;
pub mod runner;

pub use process::{OutputMode, ProcessError};
pub use runner::{RunEvent, Runner};
