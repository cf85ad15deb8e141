//! Snapshot - Read-Only Projection of the Simulation
//!
//! A [`HeapSnapshot`] is an owned copy of everything a renderer needs:
//! cells, per-space or per-region usage, the scalar counters and the
//! statistics. Taking one never mutates the simulator.

use crate::gc::{CollectorKind, Phase};
use crate::heap::{
    CellState, HeapState, MemoryCell, RegionUsage, SemiSpace, SpaceUsage, SurvivorSpace,
};
use crate::logging::describe;
use crate::stats::SimStats;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeapSnapshot {
    pub collector: CollectorKind,
    pub phase: Phase,
    /// Notification text for the current phase
    pub message: &'static str,
    pub current_step: u64,
    pub gc_cycles: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_space: Option<SemiSpace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_survivor: Option<SurvivorSpace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_eden_region_count: Option<usize>,
    /// Side length of the rendered grid
    pub grid_side: usize,
    pub cells: Vec<MemoryCell>,
    /// Empty for the region-based collector
    pub spaces: Vec<SpaceUsage>,
    /// Empty unless region-based
    pub regions: Vec<RegionUsage>,
    pub state_counts: IndexMap<CellState, usize>,
    pub running: bool,
    /// A visual hold is pending
    pub holding: bool,
    pub stats: SimStats,
}

impl HeapSnapshot {
    /// Capture the heap and statistics as they are now
    pub fn capture(heap: &HeapState, stats: &SimStats) -> Self {
        let cells = heap.cells();
        Self {
            collector: heap.collector(),
            phase: heap.phase(),
            message: describe(heap.collector(), heap.phase()),
            current_step: heap.current_step(),
            gc_cycles: heap.gc_cycles(),
            active_space: heap.active_space(),
            active_survivor: heap.active_survivor(),
            current_eden_region_count: heap.current_eden_region_count(),
            grid_side: heap.grid_side(),
            cells: cells.to_vec(),
            spaces: heap.spaces().iter().map(|s| s.usage(cells)).collect(),
            regions: heap.regions().iter().map(|r| r.usage(cells)).collect(),
            state_counts: heap.state_counts(),
            running: false,
            holding: false,
            stats: stats.clone(),
        }
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn count(&self, state: CellState) -> usize {
        self.state_counts.get(&state).copied().unwrap_or(0)
    }

    /// Cells arranged as displayed, one vector per grid row
    ///
    /// Region layouts store each region contiguously; here region `r` of a
    /// `g × g` region grid occupies block `(r / g, r % g)`.
    pub fn grid(&self) -> Vec<Vec<&MemoryCell>> {
        let side = self.grid_side.max(1);
        if self.regions.is_empty() {
            return self.cells.chunks(side).map(|row| row.iter().collect()).collect();
        }

        let region_grid = (self.regions.len() as f64).sqrt().round() as usize;
        let region_side = (side / region_grid.max(1)).max(1);
        let per_region = region_side * region_side;
        let mut rows: Vec<Vec<&MemoryCell>> = vec![Vec::with_capacity(side); side];
        for row in 0..side {
            for col in 0..side {
                let region = (row / region_side) * region_grid + col / region_side;
                let offset = (row % region_side) * region_side + col % region_side;
                if let Some(cell) = self.cells.get(region * per_region + offset) {
                    rows[row].push(cell);
                }
            }
        }
        rows
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
