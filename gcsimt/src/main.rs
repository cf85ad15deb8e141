//! Gcsimt CLI - drive the gcsim garbage-collection simulator from a terminal.
//!
//! Parses arguments with clap, sets up tracing on stderr (so JSON on stdout
//! stays machine-readable), merges the config file with command-line
//! overrides and dispatches to the command handlers.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gcsim::CollectorKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{run_init, run_run, run_step, InitArgs, RunArgs, StepArgs};
use config::{Config, Overrides};
use error::{GcsimtError, Result};

/// Gcsimt - step through garbage collectors cell by cell
///
/// Simulates mark-sweep, copying, generational and region-based collectors
/// on a small grid of memory cells.
#[derive(Parser, Debug)]
#[command(name = "gcsimt")]
#[command(author = "Gcsim Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Step-driven garbage collector simulator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "GCSIMT_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GCSIMT_CONFIG")]
    config: Option<PathBuf>,

    /// Disable color output
    #[arg(long, global = true, env = "GCSIMT_NO_COLOR")]
    no_color: bool,

    /// Print snapshots as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Collector to simulate (mark-sweep, copying, generational, region-based)
    #[arg(short = 'C', long, global = true, value_parser = parse_collector)]
    collector: Option<CollectorKind>,

    /// Grid side length
    #[arg(short, long, global = true)]
    grid_size: Option<usize>,

    /// Seed for the churn generator
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the gcsimt CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    ///
    /// Creates gcsimt.toml in the specified or current directory.
    Init(InitCommand),

    /// Perform manual steps and print the heap
    ///
    /// Visual holds are waited out on a virtual clock, so this never sleeps.
    Step(StepCommand),

    /// Auto-run in real time
    ///
    /// Uses the configured tick interval and hold delay, printing events
    /// until the collector completes or the step budget runs out.
    Run(RunCommand),
}

/// Arguments for the init subcommand.
#[derive(Parser, Debug)]
struct InitCommand {
    /// Directory to write into (default: current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Overwrite an existing configuration file
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the step subcommand.
#[derive(Parser, Debug)]
struct StepCommand {
    /// Number of steps to perform
    #[arg(short = 'n', long, default_value_t = 1)]
    steps: u64,

    /// Don't print a line per step
    #[arg(short, long)]
    quiet: bool,
}

/// Arguments for the run subcommand.
#[derive(Parser, Debug)]
struct RunCommand {
    /// Stop after this many steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Milliseconds between auto-run ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Milliseconds a visual hold lasts
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Don't print events as they happen
    #[arg(short, long)]
    quiet: bool,
}

fn parse_collector(value: &str) -> std::result::Result<CollectorKind, String> {
    value.parse().map_err(|e: gcsim::SimError| e.to_string())
}

/// Main entry point for the gcsimt CLI.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color).context("failed to set up logging")?;

    let overrides = Overrides {
        collector: cli.collector,
        grid_size: cli.grid_size,
        seed: cli.seed,
        json: cli.json,
        ..Default::default()
    };
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    execute_command(cli.command, cli.verbose, config, overrides)
        .context("command failed")?;
    Ok(())
}

/// Initialize the logging system.
///
/// Output goes to stderr. The subscriber also picks up the engine's `log`
/// records.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| GcsimtError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(
    command: Commands,
    verbose: bool,
    config: Config,
    overrides: Overrides,
) -> Result<()> {
    match command {
        Commands::Init(args) => execute_init(args, verbose),
        Commands::Step(args) => execute_step(args, config, overrides),
        Commands::Run(args) => execute_run(args, config, overrides),
    }
}

/// Execute the init command.
fn execute_init(args: InitCommand, verbose: bool) -> Result<()> {
    let init_args = InitArgs {
        verbose,
        force: args.force,
        path: args.path,
    };
    let path = run_init(init_args)?;
    println!("{}", path.display());
    Ok(())
}

/// Execute the step command.
fn execute_step(args: StepCommand, config: Config, overrides: Overrides) -> Result<()> {
    let step_args = StepArgs {
        config: config.with_overrides(&overrides)?,
        steps: args.steps,
        progress: !args.quiet,
    };
    run_step(step_args)
}

/// Execute the run command.
fn execute_run(args: RunCommand, config: Config, overrides: Overrides) -> Result<()> {
    let overrides = Overrides {
        tick_interval_ms: args.tick_ms,
        hold_ms: args.hold_ms,
        ..overrides
    };
    let run_args = RunArgs {
        config: config.with_overrides(&overrides)?,
        max_steps: args.max_steps,
        progress: !args.quiet,
    };
    run_run(run_args)
}
