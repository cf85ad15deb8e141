//! Step command implementation.
//!
//! Performs a fixed number of manual steps on a fresh simulator and prints
//! the resulting snapshot. Holds are waited out on a virtual clock, so the
//! command never sleeps.

use std::sync::Arc;

use gcsim::{Clock, HeapSnapshot, ManualClock, Simulator, StepOutcome};

use crate::commands::common::{print_snapshot, render_report};
use crate::commands::traits::{Command, CommandDescription};
use crate::config::Config;
use crate::error::{GcsimtError, Result};

/// Arguments for the step command.
#[derive(Debug, Clone, Default)]
pub struct StepArgs {
    /// Effective configuration (file plus overrides).
    pub config: Config,
    /// Number of steps to perform.
    pub steps: u64,
    /// Print one line per step.
    pub progress: bool,
}

/// Step command handler.
pub struct StepCommand {
    args: StepArgs,
}

impl StepCommand {
    /// Run the steps and return the final snapshot.
    pub fn run(&self) -> Result<HeapSnapshot> {
        if self.args.steps == 0 {
            return Err(GcsimtError::Validation(
                "number of steps must be > 0".to_string(),
            ));
        }

        let clock = ManualClock::new();
        let mut sim = Simulator::with_clock(
            self.args.config.simulation.clone(),
            Arc::new(clock.clone()),
        )?;
        let show_progress = self.args.progress && !self.args.config.output.json;

        let mut taken = 0;
        while taken < self.args.steps {
            let mut report = sim.step()?;
            if report.outcome == StepOutcome::Held {
                if let Some(hold) = report.hold {
                    clock.advance(hold.remaining(clock.now()));
                }
                report = sim.step()?;
            }

            if report.outcome == StepOutcome::Finished {
                tracing::info!("simulation complete after {} steps", sim.heap().current_step());
                break;
            }
            taken += 1;
            if show_progress {
                println!("{}", render_report(&report));
            }
        }

        Ok(sim.snapshot())
    }
}

impl Command for StepCommand {
    type Args = StepArgs;
    type Output = HeapSnapshot;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "step"
    }
}

impl CommandDescription for StepCommand {
    fn description() -> &'static str {
        "Advance a fresh simulation step by step"
    }

    fn help() -> &'static str {
        "Initializes the configured collector, performs N steps (waiting out \
         visual holds) and prints the final heap snapshot."
    }
}

/// Run the step command and print its snapshot.
pub fn run_step(args: StepArgs) -> Result<()> {
    tracing::debug!("{}: {}", StepCommand::name(), StepCommand::description());
    let output = args.config.output.clone();
    let snap = StepCommand::new(args).execute()?;
    print_snapshot(&snap, &output)
}
