//! Test Utilities for the gcsim Integration Suite
//!
//! Every fixture runs on a [`ManualClock`] with a fixed seed, so a test
//! decides exactly when holds elapse and which cells the churn touches.

#![allow(dead_code)]

use gcsim::heap::CellScope;
use gcsim::{
    CellState, CollectorKind, HeapState, ManualClock, Phase, SimConfig, Simulator, StepOutcome,
    StepReport,
};
use std::sync::Arc;

/// Upper bound on steps a test may take before it is considered stuck
pub const MAX_STEPS: usize = 5_000;

/// Seeds used by the property-style tests
pub const SEEDS: [u64; 8] = [1, 2, 3, 5, 8, 13, 21, 34];

/// ============================================================================
/// SIM FIXTURE
/// ============================================================================

/// Simulator on a manual clock
pub struct SimFixture {
    pub sim: Simulator,
    pub clock: ManualClock,
}

impl SimFixture {
    pub fn with_config(config: SimConfig) -> Self {
        let clock = ManualClock::new();
        let sim = Simulator::with_clock(config, Arc::new(clock.clone()))
            .expect("fixture config should be valid");
        Self { sim, clock }
    }

    /// Grid collector with the given side and seed
    pub fn new(collector: CollectorKind, grid_size: usize, seed: u64) -> Self {
        Self::with_config(SimConfig {
            collector,
            grid_size,
            seed: Some(seed),
            ..Default::default()
        })
    }

    /// Region-based collector with the default 4×4 regions of 4×4 cells
    pub fn regional(seed: u64) -> Self {
        Self::with_config(SimConfig {
            collector: CollectorKind::RegionBased,
            seed: Some(seed),
            ..Default::default()
        })
    }

    pub fn heap(&self) -> &HeapState {
        self.sim.heap()
    }

    pub fn phase(&self) -> Phase {
        self.sim.heap().phase()
    }

    pub fn hold_ms(&self) -> u64 {
        self.sim.config().hold_ms
    }

    /// Let any pending hold elapse, then step once
    pub fn step(&mut self) -> StepReport {
        if self.sim.pending_hold().is_some() {
            self.clock.advance_ms(self.hold_ms());
        }
        let report = self.sim.step().expect("step should succeed");
        assert!(
            !matches!(report.outcome, StepOutcome::Held | StepOutcome::Busy),
            "unexpected {:?} after the hold elapsed",
            report.outcome
        );
        report
    }

    /// Step until the heap enters `target`
    pub fn run_until(&mut self, target: Phase) {
        for _ in 0..MAX_STEPS {
            if self.phase() == target {
                return;
            }
            self.step();
        }
        panic!("never reached {} within {} steps", target, MAX_STEPS);
    }

    /// Step until the predicate holds, checking invariants on the way
    pub fn run_checked<F>(&mut self, mut done: F)
    where
        F: FnMut(&HeapState) -> bool,
    {
        for _ in 0..MAX_STEPS {
            assert_cell_accounting(self.heap());
            if done(self.heap()) {
                return;
            }
            self.step();
        }
        panic!("condition not met within {} steps", MAX_STEPS);
    }
}

/// ============================================================================
/// ASSERTIONS
/// ============================================================================

/// Per-state counts always add up to the total cell count
pub fn assert_cell_accounting(heap: &HeapState) {
    let counted: usize = heap.state_counts().values().sum();
    assert_eq!(
        counted,
        heap.total_cells(),
        "state counts lost cells at step {}",
        heap.current_step()
    );
}

/// Every cell stays inside the space or region it was created in
pub fn assert_cells_in_place(heap: &HeapState) {
    for space in heap.spaces() {
        for &i in space.cell_indices() {
            assert_eq!(heap.cells()[i].space, space.tag());
        }
    }
    for region in heap.regions() {
        for &i in region.cell_indices() {
            assert_eq!(heap.cells()[i].space, gcsim::SpaceTag::Region(region.id()));
        }
    }
}

/// Indices of every cell in the given state
pub fn indices_in(heap: &HeapState, state: CellState) -> Vec<usize> {
    heap.cells()
        .iter()
        .filter(|c| c.state == state)
        .map(|c| c.id)
        .collect()
}
