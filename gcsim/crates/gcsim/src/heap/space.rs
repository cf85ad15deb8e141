//! Spaces - Named Partitions of the Cell Array
//!
//! A space is an ordered set of cell indices with a role. It has no
//! lifecycle of its own: every query is a pure function over the cells it
//! covers, and mutation goes through the cells.

use super::cell::{CellState, MemoryCell, SpaceTag};
use serde::Serialize;

/// Round `100 × occupied / total` to the nearest integer, halves rounding up
pub fn occupancy_percent(occupied: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((occupied * 100 + total / 2) / total) as u8
}

/// CellScope - anything that groups cells by index
///
/// Implemented by [`Space`] and [`super::Region`]. Churn, marking and
/// relocation only ever touch cells reachable through a scope.
pub trait CellScope {
    /// Cell indices in allocation order
    fn cell_indices(&self) -> &[usize];

    /// Total number of cells
    fn capacity(&self) -> usize {
        self.cell_indices().len()
    }

    /// Count cells in the given state
    fn count_state(&self, cells: &[MemoryCell], state: CellState) -> usize {
        self.cell_indices()
            .iter()
            .filter(|&&i| cells[i].state == state)
            .count()
    }

    fn free_count(&self, cells: &[MemoryCell]) -> usize {
        self.count_state(cells, CellState::Free)
    }

    fn has_free(&self, cells: &[MemoryCell]) -> bool {
        self.cell_indices().iter().any(|&i| cells[i].is_free())
    }

    /// Count Referenced, Survived and Marked cells
    fn occupied_count(&self, cells: &[MemoryCell]) -> usize {
        self.cell_indices()
            .iter()
            .filter(|&&i| cells[i].state.is_occupied())
            .count()
    }

    /// Occupancy as an integer percentage
    fn occupancy(&self, cells: &[MemoryCell]) -> u8 {
        occupancy_percent(self.occupied_count(cells), self.capacity())
    }

    /// Indices of cells in the given state, in scope order
    fn indices_in_state(&self, cells: &[MemoryCell], state: CellState) -> Vec<usize> {
        self.cell_indices()
            .iter()
            .copied()
            .filter(|&i| cells[i].state == state)
            .collect()
    }

    /// Indices of free cells, in scope order
    fn free_indices(&self, cells: &[MemoryCell]) -> Vec<usize> {
        self.indices_in_state(cells, CellState::Free)
    }

    /// Release every cell in scope; returns how many were not already free
    fn release_all(&self, cells: &mut [MemoryCell]) -> usize {
        let mut released = 0;
        for &i in self.cell_indices() {
            if !cells[i].is_free() {
                released += 1;
            }
            cells[i].release();
        }
        released
    }

    /// Whether the scope contains the given cell index
    fn contains(&self, index: usize) -> bool {
        self.cell_indices().contains(&index)
    }
}

/// Space - a partition of the heap in the non-region collectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    tag: SpaceTag,
    indices: Vec<usize>,
}

impl Space {
    pub fn new(tag: SpaceTag, indices: Vec<usize>) -> Self {
        Self { tag, indices }
    }

    pub fn tag(&self) -> SpaceTag {
        self.tag
    }

    /// Summary for snapshots
    pub fn usage(&self, cells: &[MemoryCell]) -> SpaceUsage {
        SpaceUsage {
            tag: self.tag,
            capacity: self.capacity(),
            free: self.free_count(cells),
            occupied: self.occupied_count(cells),
            occupancy: self.occupancy(cells),
        }
    }
}

impl CellScope for Space {
    fn cell_indices(&self) -> &[usize] {
        &self.indices
    }
}

/// Point-in-time usage of one space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceUsage {
    pub tag: SpaceTag,
    pub capacity: usize,
    pub free: usize,
    pub occupied: usize,
    pub occupancy: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(n: usize) -> Vec<MemoryCell> {
        (0..n).map(|i| MemoryCell::new(i, SpaceTag::Heap)).collect()
    }

    #[test]
    fn test_occupancy_rounding() {
        assert_eq!(occupancy_percent(0, 16), 0);
        assert_eq!(occupancy_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(occupancy_percent(1, 3), 33);
        assert_eq!(occupancy_percent(16, 16), 100);
        assert_eq!(occupancy_percent(3, 0), 0);
    }

    #[test]
    fn test_space_queries_stay_in_scope() {
        let mut cells = cells(10);
        let space = Space::new(SpaceTag::From, vec![0, 2, 4]);
        cells[1].state = CellState::Referenced;
        cells[2].state = CellState::Referenced;
        cells[4].state = CellState::Dereferenced;

        assert_eq!(space.capacity(), 3);
        assert_eq!(space.free_count(&cells), 1);
        assert_eq!(space.occupied_count(&cells), 1);
        assert_eq!(space.occupancy(&cells), 33);
        assert_eq!(space.free_indices(&cells), vec![0]);
        assert!(!space.contains(1));
    }

    #[test]
    fn test_release_all_counts_non_free() {
        let mut cells = cells(4);
        let space = Space::new(SpaceTag::To, vec![0, 1, 2, 3]);
        cells[0].state = CellState::Survived;
        cells[0].survived_cycles = 2;
        cells[3].state = CellState::Dereferenced;

        assert_eq!(space.release_all(&mut cells), 2);
        assert!(cells.iter().all(|c| c.is_free() && c.survived_cycles == 0));
    }
}
