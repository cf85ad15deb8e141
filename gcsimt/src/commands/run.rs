//! Run command implementation.
//!
//! Drives the simulator with the background auto-run loop on the wall
//! clock until the collector completes or the step budget is used up.
//! Events are printed by the engine's logger as they happen: timestamped
//! text, or one JSON object per line with `--json`, in which case the final
//! snapshot is printed as one more line.

use std::time::{Duration, Instant};

use crossbeam::channel::RecvTimeoutError;
use gcsim::{HeapSnapshot, Runner, SimEvent, SimLogger, SimLoggerConfig, Simulator};

use crate::commands::common::print_snapshot;
use crate::commands::traits::{Command, CommandDescription};
use crate::config::Config;
use crate::error::{GcsimtError, Result};

/// How often the command checks the step budget while no event arrives.
const BUDGET_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// Arguments for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Effective configuration (file plus overrides).
    pub config: Config,
    /// Stop after this many steps; `None` runs until complete.
    pub max_steps: Option<u64>,
    /// Print events as they happen.
    pub progress: bool,
}

impl RunArgs {
    /// Logger that prints events in the configured output format
    fn event_logger(&self) -> SimLogger {
        let json = self.config.output.json;
        SimLogger::new(SimLoggerConfig {
            console: self.progress,
            json,
            timestamps: !json,
            ..Default::default()
        })
    }
}

/// Run command handler.
pub struct RunCommand {
    args: RunArgs,
}

impl RunCommand {
    /// Auto-run the simulation and return the final snapshot.
    pub fn run(&self) -> Result<HeapSnapshot> {
        let config = &self.args.config.simulation;
        if self.args.max_steps == Some(0) {
            return Err(GcsimtError::Validation(
                "--max-steps must be > 0".to_string(),
            ));
        }
        if self.args.max_steps.is_none() && config.collector.cycle_limit().is_none() {
            return Err(GcsimtError::Validation(format!(
                "{} never completes on its own; pass --max-steps",
                config.collector
            )));
        }

        let mut sim = Simulator::new(config.clone())?.with_logger(self.args.event_logger());
        let events = sim.subscribe();
        let poll = config.tick_interval().min(config.hold()).min(BUDGET_CHECK_INTERVAL);
        let mut runner = Runner::new(sim).with_poll_interval(poll);
        let shared = runner.simulator();

        let started = Instant::now();
        runner.start()?;
        loop {
            match events.recv_timeout(BUDGET_CHECK_INTERVAL) {
                Ok(SimEvent::Completed { .. }) => break,
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let sim = shared.lock();
            let over_budget = self
                .args
                .max_steps
                .is_some_and(|max| sim.heap().current_step() >= max);
            if over_budget || !sim.is_running() {
                break;
            }
        }
        runner.stop();

        let snap = shared.lock().snapshot();
        tracing::info!(
            "stopped at step {} after {:.2}s",
            snap.current_step,
            started.elapsed().as_secs_f64()
        );
        Ok(snap)
    }
}

impl Command for RunCommand {
    type Args = RunArgs;
    type Output = HeapSnapshot;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "run"
    }
}

impl CommandDescription for RunCommand {
    fn description() -> &'static str {
        "Auto-run the simulation in real time"
    }

    fn help() -> &'static str {
        "Starts the auto-run loop with the configured tick interval and hold \
         delay, prints events as they happen and the final snapshot when the \
         collector completes or the step budget runs out."
    }
}

/// Run the run command and print its snapshot.
pub fn run_run(args: RunArgs) -> Result<()> {
    tracing::debug!("{}: {}", RunCommand::name(), RunCommand::description());
    let output = args.config.output.clone();
    let snap = RunCommand::new(args).execute()?;
    if output.json {
        // Keep stdout one JSON object per line
        println!("{}", serde_json::to_string(&snap)?);
        return Ok(());
    }
    print_snapshot(&snap, &output)
}
