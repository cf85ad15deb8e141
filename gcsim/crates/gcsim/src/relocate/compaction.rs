//! Compaction - Sliding Live Cells to the Start of a Space
//!
//! Used by the generational major collection on the tenured space. Marked
//! cells are counted, the whole space is cleared, and that many cells are
//! re-packed from the first index of the space as Survived with their
//! counters reset.

use crate::heap::{CellScope, CellState, MemoryCell};

/// Outcome of compacting one space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Live cells re-packed
    pub retained: usize,
    /// Non-live, non-free cells reclaimed
    pub reclaimed: usize,
}

pub fn compact(scope: &dyn CellScope, cells: &mut [MemoryCell]) -> CompactionReport {
    let retained = scope.count_state(cells, CellState::Marked);
    let occupied = scope.capacity() - scope.free_count(cells);

    scope.release_all(cells);
    for &i in scope.cell_indices().iter().take(retained) {
        cells[i].state = CellState::Survived;
        cells[i].survived_cycles = 0;
    }

    CompactionReport {
        retained,
        reclaimed: occupied - retained,
    }
}
