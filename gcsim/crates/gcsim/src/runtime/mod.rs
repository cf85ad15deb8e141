//! Runtime Module - Scheduler and Stepper
//!
//! [`Simulator`] owns one heap and decides when the phase driver may run:
//! - `step()` advances once on external request
//! - `poll()` advances on the auto-run tick while running
//! - Hold phases defer the next transition by a fixed delay
//!
//! Only one stepping agent is armed at a time. While running, external
//! `step()` calls report `Busy` and leave the heap alone.
//!
//! ```rust
//! use gcsim::{CollectorKind, SimConfig, Simulator, StepOutcome};
//!
//! let config = SimConfig {
//!     collector: CollectorKind::Copying,
//!     grid_size: 10,
//!     seed: Some(3),
//!     ..Default::default()
//! };
//! let mut sim = Simulator::new(config)?;
//! let report = sim.step()?;
//! assert_eq!(report.outcome, StepOutcome::Allocated);
//! # Ok::<(), gcsim::SimError>(())
//! ```

pub mod clock;
pub mod hold;
pub mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use hold::{HoldHandle, HoldSlot};
pub use runner::Runner;

use crate::config::{ConfigPatch, SimConfig};
use crate::error::{Result, SimError};
use crate::gc::{Phase, PhaseDriver, StepContext};
use crate::heap::HeapState;
use crate::logging::{describe, SimEvent, SimLogger};
use crate::snapshot::HeapSnapshot;
use crate::stats::SimStats;
use crossbeam::channel::{self, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;

/// What a step request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The heap entered a new phase
    Advanced,
    /// An allocation round ran; the phase is unchanged
    Allocated,
    /// A hold is pending and not yet due; nothing changed
    Held,
    /// Running, but the next tick is not due yet; nothing changed
    Waiting,
    /// The heap is `Complete`; nothing changed
    Finished,
    /// Refused because the auto-run loop owns stepping
    Busy,
}

impl StepOutcome {
    /// Whether the heap was mutated
    pub fn mutated(self) -> bool {
        matches!(self, StepOutcome::Advanced | StepOutcome::Allocated)
    }
}

/// Per-step report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub outcome: StepOutcome,
    pub from: Phase,
    pub to: Phase,
    /// Step counter after the request
    pub step: u64,
    /// Live objects dropped for lack of a destination during this step
    pub overflowed: usize,
    /// Continuation scheduled by this step
    pub hold: Option<HoldHandle>,
}

/// Simulator - one heap, its phase driver and scheduling state
pub struct Simulator {
    config: SimConfig,
    driver: PhaseDriver,
    heap: HeapState,
    rng: StdRng,
    stats: SimStats,
    logger: SimLogger,
    subscribers: Vec<Sender<SimEvent>>,
    clock: Arc<dyn Clock>,
    running: bool,
    next_tick: Option<Instant>,
    holds: HoldSlot,
}

impl Simulator {
    /// Create a simulator on the wall clock
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a simulator on a caller-provided clock
    pub fn with_clock(config: SimConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let driver = PhaseDriver::new(&config);
        let heap = driver.initialize(&config);
        Ok(Self {
            rng: seeded_rng(&config),
            config,
            driver,
            heap,
            stats: SimStats::new(),
            logger: SimLogger::default(),
            subscribers: Vec::new(),
            clock,
            running: false,
            next_tick: None,
            holds: HoldSlot::new(),
        })
    }

    /// Replace the logger, keeping everything else
    pub fn with_logger(mut self, logger: SimLogger) -> Self {
        self.logger = logger;
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Rebuild the heap from `config`
    ///
    /// Stops the auto-run loop and cancels any pending hold. On a
    /// validation error the current heap is kept.
    pub fn initialize(&mut self, config: SimConfig) -> Result<&HeapState> {
        config.validate()?;

        self.stop_running();
        self.driver = PhaseDriver::new(&config);
        self.heap = self.driver.initialize(&config);
        self.rng = seeded_rng(&config);
        self.stats.reset();
        self.config = config;

        let epoch = self.holds.epoch();
        self.emit(SimEvent::Reset {
            collector: self.config.collector,
            epoch,
        });
        Ok(&self.heap)
    }

    /// Rebuild the heap from the current configuration
    pub fn reset(&mut self) -> Result<&HeapState> {
        self.initialize(self.config.clone())
    }

    /// Apply a partial configuration and reinitialize
    ///
    /// Rejected with `ConfigurationLocked` while running.
    pub fn configure(&mut self, patch: &ConfigPatch) -> Result<&HeapState> {
        if self.running {
            return Err(SimError::ConfigurationLocked);
        }
        let next = patch.apply(&self.config);
        self.initialize(next)
    }

    /// Start or stop the auto-run loop
    ///
    /// Starting arms the first tick one interval from now. Stopping cancels
    /// any pending hold.
    pub fn set_running(&mut self, running: bool) {
        if running == self.running {
            return;
        }
        if running {
            self.running = true;
            self.next_tick = Some(self.clock.now() + self.config.tick_interval());
            log::info!("auto-run started, tick {:?}", self.config.tick_interval());
        } else {
            self.stop_running();
            log::info!("auto-run stopped");
        }
    }

    fn stop_running(&mut self) {
        self.halt();
        self.holds.cancel();
    }

    /// Disarm the auto-run loop without touching the hold epoch
    fn halt(&mut self) {
        self.running = false;
        self.next_tick = None;
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advance once on external request
    ///
    /// Returns `Busy` while running, `Held` while a hold is pending and not
    /// yet due, and `Finished` once the heap is `Complete`.
    pub fn step(&mut self) -> Result<StepReport> {
        if self.running {
            return Ok(self.idle(StepOutcome::Busy));
        }
        if let Some(handle) = self.holds.pending() {
            if !handle.is_due(self.clock.now()) {
                return Ok(self.idle(StepOutcome::Held));
            }
            self.holds.take_due(self.clock.now());
        }
        self.advance()
    }

    /// Drive the auto-run loop: fire a due hold or a due tick
    pub fn poll(&mut self) -> Result<StepReport> {
        if !self.running {
            return Ok(self.idle(StepOutcome::Waiting));
        }
        let now = self.clock.now();

        if let Some(handle) = self.holds.pending() {
            if self.holds.take_due(now).is_none() {
                return Ok(self.idle(StepOutcome::Held));
            }
            log::trace!("hold {} elapsed", handle.id());
            return self.advance();
        }

        match self.next_tick {
            Some(due) if now >= due => {
                self.next_tick = Some(now + self.config.tick_interval());
                self.advance()
            }
            _ => Ok(self.idle(StepOutcome::Waiting)),
        }
    }

    /// Fire the continuation identified by `handle`
    ///
    /// Fails with `StaleTransition` when the handle was cancelled or has
    /// already fired. A handle that is not due yet is a no-op (`Held`).
    pub fn resume(&mut self, handle: HoldHandle) -> Result<StepReport> {
        self.holds.validate(&handle)?;
        if self.running {
            return Ok(self.idle(StepOutcome::Busy));
        }
        if self.holds.take_due(self.clock.now()).is_none() {
            return Ok(self.idle(StepOutcome::Held));
        }
        self.advance()
    }

    /// Run the phase driver once and publish what happened
    fn advance(&mut self) -> Result<StepReport> {
        let overflow_before = self.stats.overflowed;
        let cycles_before = self.heap.gc_cycles();

        let mut ctx = StepContext {
            rng: &mut self.rng,
            stats: &mut self.stats,
        };
        let transition = match self.driver.step(&mut self.heap, &mut ctx)? {
            Some(t) => t,
            None => {
                self.halt();
                return Ok(self.idle(StepOutcome::Finished));
            }
        };

        let kind = self.driver.kind();
        let step = self.heap.current_step();
        let overflowed = (self.stats.overflowed - overflow_before) as usize;

        if overflowed > 0 {
            self.emit(SimEvent::CapacityOverflow {
                collector: kind,
                phase: transition.to,
                dropped: overflowed,
                step,
            });
        }
        if self.heap.gc_cycles() > cycles_before {
            self.emit(SimEvent::CycleEnd {
                collector: kind,
                cycle: self.heap.gc_cycles(),
                step,
            });
        }
        if transition.changed() {
            self.emit(SimEvent::PhaseChange {
                collector: kind,
                from: transition.from,
                to: transition.to,
                step,
                message: describe(kind, transition.to).to_string(),
            });
        }

        let mut hold = None;
        if transition.to.holds() {
            let due = self.clock.now() + self.config.hold();
            hold = Some(self.holds.schedule(transition.to, due));
            self.stats.record_hold();
        }

        if transition.to.is_terminal() {
            self.halt();
            self.emit(SimEvent::Completed {
                collector: kind,
                cycles: self.heap.gc_cycles(),
                step,
            });
        }

        Ok(StepReport {
            outcome: if transition.changed() {
                StepOutcome::Advanced
            } else {
                StepOutcome::Allocated
            },
            from: transition.from,
            to: transition.to,
            step,
            overflowed,
            hold,
        })
    }

    fn idle(&self, outcome: StepOutcome) -> StepReport {
        let phase = self.heap.phase();
        StepReport {
            outcome,
            from: phase,
            to: phase,
            step: self.heap.current_step(),
            overflowed: 0,
            hold: self.holds.pending(),
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Receive every event from now on
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<SimEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: SimEvent) {
        self.logger.log(&event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> HeapSnapshot {
        let mut snap = HeapSnapshot::capture(&self.heap, &self.stats);
        snap.running = self.running;
        snap.holding = self.holds.pending().is_some();
        snap
    }

    pub fn heap(&self) -> &HeapState {
        &self.heap
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn logger(&self) -> &SimLogger {
        &self.logger
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending_hold(&self) -> Option<HoldHandle> {
        self.holds.pending()
    }

    /// Current cancellation epoch
    pub fn epoch(&self) -> u64 {
        self.holds.epoch()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("collector", &self.config.collector)
            .field("phase", &self.heap.phase())
            .field("step", &self.heap.current_step())
            .field("running", &self.running)
            .field("pending_hold", &self.holds.pending())
            .finish()
    }
}

fn seeded_rng(config: &SimConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::SimLoggerConfig;
    use crate::gc::CollectorKind;

    fn manual(collector: CollectorKind) -> (Simulator, ManualClock) {
        let clock = ManualClock::new();
        let config = SimConfig {
            collector,
            grid_size: 10,
            seed: Some(99),
            ..Default::default()
        };
        let sim = Simulator::with_clock(config, Arc::new(clock.clone())).unwrap();
        (sim, clock)
    }

    fn step_until(sim: &mut Simulator, clock: &ManualClock, phase: Phase) {
        for _ in 0..500 {
            if sim.heap().phase() == phase {
                return;
            }
            clock.advance_ms(sim.config().hold_ms);
            sim.step().unwrap();
        }
        panic!("never reached {}", phase);
    }

    #[test]
    fn test_step_during_hold_is_noop() {
        let (mut sim, clock) = manual(CollectorKind::MarkSweep);
        step_until(&mut sim, &clock, Phase::Marking);
        let hold = sim.pending_hold().unwrap();
        assert_eq!(hold.phase(), Phase::Marking);

        let before = sim.heap().clone();
        let report = sim.step().unwrap();
        assert_eq!(report.outcome, StepOutcome::Held);
        assert_eq!(sim.heap(), &before);

        clock.advance_ms(sim.config().hold_ms);
        let report = sim.step().unwrap();
        assert_eq!(report.outcome, StepOutcome::Advanced);
        assert_eq!(report.to, Phase::Sweeping);
        assert!(sim.pending_hold().is_none());
    }

    #[test]
    fn test_reset_cancels_hold() {
        let (mut sim, clock) = manual(CollectorKind::Copying);
        step_until(&mut sim, &clock, Phase::Marking);
        let hold = sim.pending_hold().unwrap();

        sim.reset().unwrap();
        clock.advance_ms(10_000);
        assert!(matches!(
            sim.resume(hold),
            Err(SimError::StaleTransition { .. })
        ));
        assert_eq!(sim.heap().phase(), Phase::Allocating);
        assert_eq!(sim.heap().current_step(), 0);
    }

    #[test]
    fn test_manual_step_refused_while_running() {
        let (mut sim, _clock) = manual(CollectorKind::MarkSweep);
        sim.set_running(true);
        let report = sim.step().unwrap();
        assert_eq!(report.outcome, StepOutcome::Busy);
        assert_eq!(sim.heap().current_step(), 0);
    }

    #[test]
    fn test_configure_locked_while_running() {
        let (mut sim, _clock) = manual(CollectorKind::MarkSweep);
        sim.set_running(true);
        let patch = ConfigPatch {
            grid_size: Some(12),
            ..Default::default()
        };
        assert!(matches!(
            sim.configure(&patch),
            Err(SimError::ConfigurationLocked)
        ));

        sim.set_running(false);
        sim.configure(&patch).unwrap();
        assert_eq!(sim.heap().total_cells(), 144);
    }

    #[test]
    fn test_poll_waits_for_tick() {
        let (mut sim, clock) = manual(CollectorKind::MarkSweep);
        sim.set_running(true);
        assert_eq!(sim.poll().unwrap().outcome, StepOutcome::Waiting);

        clock.advance_ms(sim.config().tick_interval_ms);
        assert_eq!(sim.poll().unwrap().outcome, StepOutcome::Allocated);
        assert_eq!(sim.poll().unwrap().outcome, StepOutcome::Waiting);
    }

    #[test]
    fn test_subscribers_receive_phase_changes() {
        let (mut sim, clock) = manual(CollectorKind::MarkSweep);
        let rx = sim.subscribe();
        step_until(&mut sim, &clock, Phase::Marking);

        let events: Vec<SimEvent> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::PhaseChange {
                to: Phase::Marking,
                ..
            }
        )));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (mut sim, _clock) = manual(CollectorKind::MarkSweep);
        drop(sim.subscribe());
        sim.reset().unwrap();
        assert!(sim.subscribers.is_empty());
    }

    #[test]
    fn test_finishing_disarms_auto_run() {
        let (mut sim, clock) = manual(CollectorKind::MarkSweep);
        step_until(&mut sim, &clock, Phase::Complete);
        let epoch = sim.epoch();

        sim.set_running(true);
        assert!(sim.next_tick.is_some());
        clock.advance_ms(sim.config().tick_interval_ms);

        let report = sim.poll().unwrap();
        assert_eq!(report.outcome, StepOutcome::Finished);
        assert!(!sim.is_running());
        assert!(sim.next_tick.is_none());
        assert_eq!(sim.epoch(), epoch);
    }

    #[test]
    fn test_reaching_complete_disarms_auto_run() {
        let (mut sim, clock) = manual(CollectorKind::Copying);
        sim.set_running(true);
        for _ in 0..5000 {
            if sim.heap().phase() == Phase::Complete {
                break;
            }
            clock.advance_ms(sim.config().tick_interval_ms.max(sim.config().hold_ms));
            sim.poll().unwrap();
        }
        assert_eq!(sim.heap().phase(), Phase::Complete);
        assert!(!sim.is_running());
        assert!(sim.next_tick.is_none());
    }

    #[test]
    fn test_custom_logger_records_history() {
        let (sim, clock) = manual(CollectorKind::MarkSweep);
        let mut sim = sim.with_logger(SimLogger::new(SimLoggerConfig {
            history: 2,
            timestamps: false,
            ..Default::default()
        }));
        step_until(&mut sim, &clock, Phase::Sweeping);

        let events = sim.logger().events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events.last(),
            Some(SimEvent::PhaseChange { to: Phase::Sweeping, .. })
        ));
    }
}
