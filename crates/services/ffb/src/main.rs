//! ffb - test pipeline for the ff neural network library
//!
//! Compiles each test program of the library together with the library's
//! source modules, then runs the produced binaries one after the other and
//! reports how each of them fared.
//!
//! - **Parse**: Show the resolved test table
//! - **Build**: Compile every test program
//! - **Run**: Run the test programs already on disk
//! - **Test**: Build, then run every test that built
//!
//! Without `--config` the library's built-in table is used: `backprop`
//! (built with `NN_DEBUG`) and `fftests`, both linked against `src/ff/*.cpp`.

mod cli;
mod commands;
mod common;
mod compiler;
mod error;
mod logs;
mod pipeline;
mod prelude;
mod run_output;
mod session;
mod sources;
#[cfg(all(test, unix))]
mod test_utils;

use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::Parser;
use cli::{Cli, Commands};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::prelude::*;
use crate::{
    commands::{handle_build, handle_parse, handle_run, handle_test},
    session::{Overrides, Session},
};

/// Main entry point for ffb.
///
/// # Examples
///
/// ```bash
/// # Show the built-in test table
/// ffb parse
///
/// # Build and run everything with optimisations
/// ffb --profile release test
///
/// # Build and run one test from a configuration file, keeping a report
/// ffb --config ffb.toml test --only backprop --report report.json
/// ```
#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ffb=info,ff_io=info,ff_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let stop = Arc::new(AtomicBool::new(false));
    let ctrl_c_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping the running process");
            ctrl_c_stop.store(true, Ordering::Relaxed);
        }
    });

    let overrides = Overrides {
        base_dir: cli.base_dir,
        profile: cli.profile,
        compiler: cli.compiler,
        capture: cli.capture,
    };
    let mut session = Session::create(cli.config, overrides, stop)?;

    let success = match cli.command {
        Commands::Parse => handle_parse(&session)?,
        Commands::Build { selection } => handle_build(&session, &selection.only).await?,
        Commands::Run { selection } => handle_run(&session, &selection.only).await?,
        Commands::Test {
            selection,
            report,
            dump_logs,
        } => {
            if dump_logs.is_some() {
                session.capture();
            }
            handle_test(
                &session,
                &selection.only,
                report.as_deref(),
                dump_logs.as_deref(),
            )
            .await?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
