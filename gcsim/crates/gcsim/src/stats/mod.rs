//! Stats Module - Simulation Counters
//!
//! Collects running totals for one simulation:
//! - Collection counts (total, minor, major)
//! - Churn volume (allocated, dereferenced)
//! - Collector work (marked, reclaimed, copied, promoted)
//! - Capacity overflow (objects dropped for lack of a destination)
//!
//! Counters are reset together with the heap.

use crate::allocator::ChurnReport;
use crate::relocate::RelocationReport;
use serde::Serialize;

/// Kind of collection that just completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// Whole-heap collection (mark-sweep, copying)
    Full,
    /// Young collection (generational minor GC, region evacuation)
    Minor,
    /// Tenured compaction
    Major,
}

/// SimStats - counters for one simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Completed collections of any kind
    pub total_cycles: u64,
    pub minor_cycles: u64,
    pub major_cycles: u64,
    /// Steps that changed state
    pub steps: u64,
    pub allocation_rounds: u64,
    pub cells_allocated: u64,
    pub cells_dereferenced: u64,
    pub cells_marked: u64,
    /// Live cells killed by stochastic mortality
    pub cells_killed: u64,
    pub cells_reclaimed: u64,
    pub cells_copied: u64,
    pub cells_promoted: u64,
    /// Live objects dropped because no destination had room
    pub overflowed: u64,
    /// Relocation passes that dropped at least one object
    pub overflow_events: u64,
    /// Visual holds scheduled
    pub holds: u64,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    pub fn record_churn(&mut self, report: &ChurnReport) {
        self.allocation_rounds += 1;
        self.cells_allocated += report.allocated.len() as u64;
        self.cells_dereferenced += report.dereferenced.len() as u64;
    }

    pub fn record_marked(&mut self, count: usize) {
        self.cells_marked += count as u64;
    }

    pub fn record_mortality(&mut self, count: usize) {
        self.cells_killed += count as u64;
    }

    pub fn record_reclaimed(&mut self, count: usize) {
        self.cells_reclaimed += count as u64;
    }

    /// Record a relocation pass; returns the objects it dropped
    pub fn record_relocation(&mut self, report: &RelocationReport) -> usize {
        self.cells_copied += report.copied as u64;
        self.cells_promoted += report.promoted as u64;
        if report.overflowed > 0 {
            self.overflowed += report.overflowed as u64;
            self.overflow_events += 1;
            log::warn!(
                "capacity overflow: {} live objects had no destination",
                report.overflowed
            );
        }
        report.overflowed
    }

    pub fn record_cycle(&mut self, kind: CycleKind) {
        self.total_cycles += 1;
        match kind {
            CycleKind::Minor => self.minor_cycles += 1,
            CycleKind::Major => self.major_cycles += 1,
            CycleKind::Full => {}
        }
    }

    pub fn record_hold(&mut self) {
        self.holds += 1;
    }

    /// Share of marked cells that reached a destination or stayed in place
    ///
    /// Returns 1.0 before anything was marked.
    pub fn survival_rate(&self) -> f64 {
        if self.cells_marked == 0 {
            return 1.0;
        }
        let lost = self.overflowed.min(self.cells_marked);
        (self.cells_marked - lost) as f64 / self.cells_marked as f64
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
