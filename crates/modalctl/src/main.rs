#![warn(missing_docs)]

//! Entry point for the `modalctl` binary.

mod cli;
mod error;
mod script;

use std::{fs, io, process};

use clap::Parser;
use modal_host::HostConfig;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{CheckArgs, Cli, Commands, RunArgs},
    error::{Error, Result},
    script::Runner,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli { log, command } = Cli::parse();
    let log_spec = log.spec();
    let env_filter = logging::env_filter_from_spec(&log_spec);
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .try_init()
        .ok();

    match command {
        Commands::Run(args) => run_script(&args),
        Commands::Check(args) => check(&args),
    }
}

/// Execute a script and print one report block per step.
fn run_script(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let text = fs::read_to_string(&args.script)?;
    let steps = script::parse(&text)
        .map_err(|e| Error::script(format!("{}: {e}", args.script.display())))?;
    info!(steps = steps.len(), script = %args.script.display(), "running script");

    let mut runner = Runner::new(config);
    for (idx, report) in runner.run_all(&steps).iter().enumerate() {
        println!("{:>3}. {report}", idx + 1);
    }
    println!("dismissed: {}", runner.dismissed_total());
    Ok(())
}

/// Validate a configuration file and print its effective values.
fn check(args: &CheckArgs) -> Result<()> {
    let config = HostConfig::load(&args.config)?;
    println!(
        "{}: ok (event_capacity={}, animated={:?}, default_props={:?})",
        args.config.display(),
        config.event_capacity,
        config.animated,
        config.default_props
    );
    Ok(())
}
