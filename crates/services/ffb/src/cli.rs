//! Command-line interface for the ff test pipeline.

use clap::{Args, Parser, Subcommand};
use ff_config::BuildProfile;
use std::path::PathBuf;

/// Command-line interface for ffb.
#[derive(Parser)]
#[command(name = "ffb")]
#[command(about = "ffb - Build the ff library's test programs and run them")]
pub struct Cli {
    /// Path to a TOML file describing the tests. Without it the library's
    /// built-in test table is used
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory every relative source, include and output path is resolved
    /// against. Defaults to the configuration's `base_dir`, then to the
    /// current directory
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,

    /// Build profile (debug or release)
    #[arg(short, long)]
    pub profile: Option<BuildProfile>,

    /// Compiler program, overriding the configuration
    #[arg(long)]
    pub compiler: Option<String>,

    /// Capture compiler and test output instead of letting it go straight
    /// to the terminal. Captured output is still echoed
    #[arg(long)]
    pub capture: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Test selection shared by the pipeline commands.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Only handle the named test. Can be repeated; declaration order is kept
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse and display the test table
    Parse,
    /// Compile every test program
    Build {
        #[command(flatten)]
        selection: Selection,
    },
    /// Run previously built test programs
    Run {
        #[command(flatten)]
        selection: Selection,
    },
    /// Compile every test program, then run the ones that built
    Test {
        #[command(flatten)]
        selection: Selection,

        /// Write a JSON report of the run
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write captured output to a file, or to stdout when `-`. Implies
        /// --capture
        #[arg(long)]
        dump_logs: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_test_command() {
        let cli = Cli::try_parse_from([
            "ffb",
            "--profile",
            "release",
            "--capture",
            "test",
            "--only",
            "fftests",
            "--only",
            "backprop",
            "--report",
            "report.json",
        ])
        .unwrap();

        assert_eq!(cli.profile, Some(BuildProfile::Release));
        assert!(cli.capture);
        match cli.command {
            Commands::Test {
                selection, report, ..
            } => {
                assert_eq!(selection.only, vec!["fftests", "backprop"]);
                assert_eq!(report, Some(PathBuf::from("report.json")));
            }
            _ => panic!("expected the test command"),
        }
    }

    #[test]
    fn dump_logs_accepts_dash() {
        let cli = Cli::try_parse_from(["ffb", "test", "--dump-logs", "-"]).unwrap();
        match cli.command {
            Commands::Test { dump_logs, .. } => assert_eq!(dump_logs, Some(PathBuf::from("-"))),
            _ => panic!("expected the test command"),
        }
    }

    #[test]
    fn rejects_unknown_profile() {
        assert!(Cli::try_parse_from(["ffb", "--profile", "fast", "build"]).is_err());
    }
}
