//! Command-line interface definitions for modalctl.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;

/// Command-line interface for the `modalctl` binary.
#[derive(Parser, Debug)]
#[command(
    name = "modalctl",
    about = "Scripted modal lifecycle scenarios on a headless platform",
    version
)]
pub struct Cli {
    /// Logging controls shared across binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a RON step script and print states and dismiss notifications after each step.
    Run(RunArgs),
    /// Parse and validate a host configuration file.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Script file: a RON list of steps, e.g. `[Create(1), Present(1, true), CompleteAll]`.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Optional host configuration file (RON).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Host configuration file (RON).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}
