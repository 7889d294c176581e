//! Command handlers for ffb.
//!
//! Each pipeline handler prints a summary table and returns whether the
//! command succeeded; `main` turns that into the process exit code.

use std::io::stdout;
use std::path::Path;

use ff_config::BuildDescriptor;
use tracing::info;

use crate::logs::{dump_logs, dump_logs_to_file};
use crate::pipeline::PipelineReport;
use crate::prelude::*;
use crate::run_output::PipelineOutput;
use crate::session::Session;

/// Handles the parse command to display the test table.
pub fn handle_parse(session: &Session) -> Result<bool> {
    let config = &session.config;
    let toolchain = &config.toolchain;

    println!("Configuration parsed successfully");
    if let Some(path) = &session.config_path {
        println!("Configuration file: {}", path.display());
    }
    println!("Version: {}", config.version);
    println!("Base directory: {}", config.base_dir.display());
    println!(
        "Compiler: {} {}",
        toolchain.compiler,
        toolchain.compiler_args.join(" ")
    );
    println!("Include directories: {:?}", toolchain.include_dirs);
    println!(
        "Profile: {} {:?}",
        toolchain.profile,
        toolchain.profile.flags()
    );
    println!("Number of tests: {}", config.tests.len());

    for (idx, test) in config.tests.iter().enumerate() {
        println!("\nTest {}: {}", idx + 1, test.name);
        println!("  Entry: {}", test.entry.display());
        println!("  Sources: {:?}", test.sources);
        println!("  Defines: {:?}", test.defines);
        println!("  Flags: {:?}", test.flags);
        println!("  Output: {}", test.output.display());
    }

    Ok(true)
}

fn select<'a>(session: &'a Session, only: &[String]) -> Result<Vec<&'a BuildDescriptor>> {
    Ok(session.config.select(only)?)
}

fn summarize(report: &PipelineReport) -> Result<bool> {
    println!();
    report.write_summary(stdout().lock())?;
    Ok(report.success)
}

/// Handles the build command: build phase only.
pub async fn handle_build(session: &Session, only: &[String]) -> Result<bool> {
    let descriptors = select(session, only)?;
    let mut output = PipelineOutput::new();
    let report = session.pipeline().build_all(&descriptors, &mut output).await?;
    summarize(&report)
}

/// Handles the run command: execute phase only.
pub async fn handle_run(session: &Session, only: &[String]) -> Result<bool> {
    let descriptors = select(session, only)?;
    let mut output = PipelineOutput::new();
    let report = session
        .pipeline()
        .execute_all(&descriptors, &mut output)
        .await?;
    summarize(&report)
}

/// Handles the test command: build every test, then run the ones that built.
pub async fn handle_test(
    session: &Session,
    only: &[String],
    report_path: Option<&Path>,
    logs_path: Option<&Path>,
) -> Result<bool> {
    let descriptors = select(session, only)?;
    let mut output = PipelineOutput::new();
    let report = session.pipeline().run_all(&descriptors, &mut output).await?;

    if let Some(path) = report_path {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Report written to {:?}", path);
    }
    match logs_path {
        Some(path) if path == Path::new("-") => dump_logs(&report, stdout().lock())?,
        Some(path) => dump_logs_to_file(&report, path)?,
        None => {}
    }
    summarize(&report)
}
