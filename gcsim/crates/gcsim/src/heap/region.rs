//! Region Implementation - Unit of Heap Management
//!
//! Region is a fixed-size block of cells whose role can change at run time.
//! Regions are only used by the region-based collector.
//!
//! Region Lifecycle:
//! ```text
//! Unassigned ──▶ Eden ──▶ (evacuated) ──▶ Unassigned
//!
//! SurvivorFrom, SurvivorTo and Tenured are seeded at initialization and
//! keep their type.
//! ```

use super::cell::MemoryCell;
use super::space::CellScope;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Role of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Not in use
    Unassigned,
    /// Young allocation region
    Eden,
    /// Survivor source region
    SurvivorFrom,
    /// Evacuation destination
    SurvivorTo,
    /// Old generation region
    Tenured,
    /// Reserved for objects larger than one region; no allocation path
    /// produces one yet
    Humongous,
}

impl RegionKind {
    /// Seed order used at initialization
    pub const SEEDS: [RegionKind; 4] = [
        RegionKind::Eden,
        RegionKind::SurvivorFrom,
        RegionKind::SurvivorTo,
        RegionKind::Tenured,
    ];
}

/// Region - a retypeable group of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    id: usize,
    kind: RegionKind,
    indices: Vec<usize>,
}

impl Region {
    /// Create a region covering a contiguous range of cell indices
    pub fn new(id: usize, kind: RegionKind, range: Range<usize>) -> Self {
        Self {
            id,
            kind,
            indices: range.collect(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn is(&self, kind: RegionKind) -> bool {
        self.kind == kind
    }

    /// Change the region's role
    pub(crate) fn retype(&mut self, kind: RegionKind) {
        log::trace!("region {} retyped {:?} -> {:?}", self.id, self.kind, kind);
        self.kind = kind;
    }

    /// Summary for snapshots
    pub fn usage(&self, cells: &[MemoryCell]) -> RegionUsage {
        RegionUsage {
            id: self.id,
            kind: self.kind,
            capacity: self.capacity(),
            free: self.free_count(cells),
            occupancy: self.occupancy(cells),
        }
    }
}

impl CellScope for Region {
    fn cell_indices(&self) -> &[usize] {
        &self.indices
    }
}

/// Point-in-time usage of one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionUsage {
    pub id: usize,
    pub kind: RegionKind,
    pub capacity: usize,
    pub free: usize,
    pub occupancy: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::cell::{CellState, SpaceTag};

    #[test]
    fn test_region_covers_range() {
        let region = Region::new(2, RegionKind::Unassigned, 8..12);
        assert_eq!(region.cell_indices(), &[8, 9, 10, 11]);
        assert_eq!(region.capacity(), 4);
    }

    #[test]
    fn test_retype_round_trip() {
        let mut region = Region::new(0, RegionKind::Unassigned, 0..4);
        region.retype(RegionKind::Eden);
        assert!(region.is(RegionKind::Eden));
        region.retype(RegionKind::Unassigned);
        assert!(region.is(RegionKind::Unassigned));
    }

    #[test]
    fn test_occupancy_ignores_garbage() {
        let mut cells: Vec<_> = (0..4).map(|i| MemoryCell::new(i, SpaceTag::Region(0))).collect();
        let region = Region::new(0, RegionKind::Eden, 0..4);
        cells[0].state = CellState::Referenced;
        cells[1].state = CellState::Dereferenced;
        cells[2].state = CellState::Dereferenced;
        cells[3].state = CellState::Dereferenced;

        assert_eq!(region.occupancy(&cells), 25);
        assert!(!region.has_free(&cells));
    }
}
