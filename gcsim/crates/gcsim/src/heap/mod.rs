//! Heap Module - Cell, Space and Region Model
//!
//! [`HeapState`] owns the flat cell array plus the partitions each
//! collector lays over it, and the scalar counters of the simulation.
//!
//! Layouts per collector:
//! ```text
//! mark-sweep     one Heap space covering every cell
//! copying        From = first half of the indices, To = the rest
//! generational   columns: Eden 20% | Survivor0 | Survivor1 | Tenured ~50%
//! region-based   regionGrid² regions of regionSize² cells each
//! ```
//!
//! Queries are pure; only the phase drivers in [`crate::gc`] mutate.

pub mod cell;
pub mod region;
pub mod space;

pub use cell::{CellState, MemoryCell, SpaceTag};
pub use region::{Region, RegionKind, RegionUsage};
pub use space::{occupancy_percent, CellScope, Space, SpaceUsage};

use crate::error::{Result, SimError};
use crate::gc::{CollectorKind, Phase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which semispace of the copying collector is allocating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemiSpace {
    From,
    To,
}

impl SemiSpace {
    pub fn tag(self) -> SpaceTag {
        match self {
            SemiSpace::From => SpaceTag::From,
            SemiSpace::To => SpaceTag::To,
        }
    }

    pub fn other(self) -> Self {
        match self {
            SemiSpace::From => SemiSpace::To,
            SemiSpace::To => SemiSpace::From,
        }
    }
}

/// Which survivor space receives copies in the current minor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivorSpace {
    S0,
    S1,
}

impl SurvivorSpace {
    pub fn tag(self) -> SpaceTag {
        match self {
            SurvivorSpace::S0 => SpaceTag::Survivor0,
            SurvivorSpace::S1 => SpaceTag::Survivor1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            SurvivorSpace::S0 => SurvivorSpace::S1,
            SurvivorSpace::S1 => SurvivorSpace::S0,
        }
    }
}

/// HeapState - the complete simulated heap
///
/// Built by a collector's `initialize`, mutated only by its `step`, and
/// replaced wholesale on reinitialize.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapState {
    collector: CollectorKind,
    /// Side length of the rendered grid
    grid_side: usize,
    cells: Vec<MemoryCell>,
    spaces: Vec<Space>,
    regions: Vec<Region>,
    current_step: u64,
    gc_cycles: u64,
    phase: Phase,
    active_space: Option<SemiSpace>,
    active_survivor: Option<SurvivorSpace>,
    current_eden_region_count: Option<usize>,
}

impl HeapState {
    fn empty(collector: CollectorKind, grid_side: usize, cells: Vec<MemoryCell>) -> Self {
        Self {
            collector,
            grid_side,
            cells,
            spaces: Vec::new(),
            regions: Vec::new(),
            current_step: 0,
            gc_cycles: 0,
            phase: Phase::Allocating,
            active_space: None,
            active_survivor: None,
            current_eden_region_count: None,
        }
    }

    /// Mark-sweep layout: a single space holding all `grid²` cells
    pub fn mark_sweep(grid_size: usize) -> Self {
        let total = grid_size * grid_size;
        let cells = (0..total).map(|i| MemoryCell::new(i, SpaceTag::Heap)).collect();
        let mut heap = Self::empty(CollectorKind::MarkSweep, grid_size, cells);
        heap.spaces.push(Space::new(SpaceTag::Heap, (0..total).collect()));
        heap
    }

    /// Two-space layout: first half From, second half To
    ///
    /// With an odd cell count the extra cell belongs to To.
    pub fn copying(grid_size: usize) -> Self {
        let total = grid_size * grid_size;
        let half = total / 2;
        let cells = (0..total)
            .map(|i| {
                let tag = if i < half { SpaceTag::From } else { SpaceTag::To };
                MemoryCell::new(i, tag)
            })
            .collect();
        let mut heap = Self::empty(CollectorKind::Copying, grid_size, cells);
        heap.spaces.push(Space::new(SpaceTag::From, (0..half).collect()));
        heap.spaces.push(Space::new(SpaceTag::To, (half..total).collect()));
        heap.active_space = Some(SemiSpace::From);
        heap
    }

    /// Generational layout by column bands
    ///
    /// Eden takes 20% of the columns, tenured half, and the survivor band
    /// is split evenly between the two survivor spaces. A leftover survivor
    /// column goes to tenured.
    pub fn generational(grid_size: usize) -> Self {
        let (eden, s0, s1) = generational_columns(grid_size);
        let tag_of = |col: usize| {
            if col < eden {
                SpaceTag::Eden
            } else if col < eden + s0 {
                SpaceTag::Survivor0
            } else if col < eden + s0 + s1 {
                SpaceTag::Survivor1
            } else {
                SpaceTag::Tenured
            }
        };

        let total = grid_size * grid_size;
        let cells: Vec<MemoryCell> = (0..total)
            .map(|i| MemoryCell::new(i, tag_of(i % grid_size)))
            .collect();

        let mut heap = Self::empty(CollectorKind::Generational, grid_size, cells);
        for tag in [
            SpaceTag::Eden,
            SpaceTag::Survivor0,
            SpaceTag::Survivor1,
            SpaceTag::Tenured,
        ] {
            // Row-major order within each band
            let indices = (0..total).filter(|&i| tag_of(i % grid_size) == tag).collect();
            heap.spaces.push(Space::new(tag, indices));
        }
        heap.active_survivor = Some(SurvivorSpace::S0);
        heap
    }

    /// Region layout: `region_grid²` regions of `region_size²` cells
    ///
    /// Regions are stored contiguously; region 0..4 are seeded as Eden,
    /// SurvivorFrom, SurvivorTo and Tenured when they exist.
    pub fn regional(region_grid: usize, region_size: usize) -> Self {
        let region_count = region_grid * region_grid;
        let per_region = region_size * region_size;
        let cells = (0..region_count * per_region)
            .map(|i| MemoryCell::new(i, SpaceTag::Region(i / per_region)))
            .collect();

        let mut heap = Self::empty(
            CollectorKind::RegionBased,
            region_grid * region_size,
            cells,
        );
        heap.regions = (0..region_count)
            .map(|id| {
                let kind = RegionKind::SEEDS
                    .get(id)
                    .copied()
                    .unwrap_or(RegionKind::Unassigned);
                Region::new(id, kind, id * per_region..(id + 1) * per_region)
            })
            .collect();
        heap.current_eden_region_count = Some(heap.eden_region_count());
        heap
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn collector(&self) -> CollectorKind {
        self.collector
    }

    pub fn grid_side(&self) -> usize {
        self.grid_side
    }

    pub fn cells(&self) -> &[MemoryCell] {
        &self.cells
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn gc_cycles(&self) -> u64 {
        self.gc_cycles
    }

    pub fn active_space(&self) -> Option<SemiSpace> {
        self.active_space
    }

    pub fn active_survivor(&self) -> Option<SurvivorSpace> {
        self.active_survivor
    }

    pub fn current_eden_region_count(&self) -> Option<usize> {
        self.current_eden_region_count
    }

    /// Free cells across the whole heap
    pub fn free_count(&self) -> usize {
        self.count_state(CellState::Free)
    }

    pub fn count_state(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| c.state == state).count()
    }

    /// Cell count per state, in [`CellState::ALL`] order
    pub fn state_counts(&self) -> IndexMap<CellState, usize> {
        let mut counts: IndexMap<CellState, usize> =
            CellState::ALL.iter().map(|&s| (s, 0)).collect();
        for cell in &self.cells {
            *counts.entry(cell.state).or_insert(0) += 1;
        }
        counts
    }

    /// Look up a space by tag
    pub fn space(&self, tag: SpaceTag) -> Result<&Space> {
        find_space(&self.spaces, tag)
    }

    /// Regions of the given kind, in id order
    pub fn regions_of(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.is(kind))
    }

    /// First region of the given kind
    pub fn region_of(&self, kind: RegionKind) -> Result<&Region> {
        self.regions_of(kind)
            .next()
            .ok_or_else(|| SimError::NoAvailableSource {
                space: format!("{:?} region", kind),
            })
    }

    pub fn eden_region_count(&self) -> usize {
        self.regions_of(RegionKind::Eden).count()
    }

    // ------------------------------------------------------------------
    // Mutation (phase drivers only)
    // ------------------------------------------------------------------

    pub(crate) fn cells_mut(&mut self) -> &mut [MemoryCell] {
        &mut self.cells
    }

    /// Split borrow: spaces together with mutable cells
    pub(crate) fn spaces_and_cells(&mut self) -> (&[Space], &mut [MemoryCell]) {
        (&self.spaces, &mut self.cells)
    }

    /// Split borrow: all regions (mutable) together with mutable cells
    pub(crate) fn regions_and_cells(&mut self) -> (&mut [Region], &mut [MemoryCell]) {
        (&mut self.regions, &mut self.cells)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn advance_step(&mut self) {
        self.current_step += 1;
    }

    pub(crate) fn complete_cycle(&mut self) -> u64 {
        self.gc_cycles += 1;
        self.gc_cycles
    }

    pub(crate) fn flip_active_space(&mut self) {
        self.active_space = self.active_space.map(SemiSpace::other);
    }

    pub(crate) fn flip_active_survivor(&mut self) {
        self.active_survivor = self.active_survivor.map(SurvivorSpace::other);
    }

    pub(crate) fn sync_eden_region_count(&mut self) {
        self.current_eden_region_count = Some(self.eden_region_count());
    }
}

/// Look up a non-empty space by tag
///
/// A missing or empty space means the layout cannot host the collector.
pub fn find_space(spaces: &[Space], tag: SpaceTag) -> Result<&Space> {
    spaces
        .iter()
        .find(|s| s.tag() == tag && s.capacity() > 0)
        .ok_or_else(|| SimError::NoAvailableSource {
            space: format!("{:?}", tag),
        })
}

/// Column widths (eden, survivor0, survivor1) for a generational grid
///
/// Tenured takes the remaining columns.
pub fn generational_columns(grid_size: usize) -> (usize, usize, usize) {
    let eden = (grid_size / 5).max(1);
    let tenured = (grid_size / 2).max(1);
    let survivor_band = grid_size.saturating_sub(eden + tenured);
    let survivor = survivor_band / 2;
    (eden, survivor, survivor)
}
