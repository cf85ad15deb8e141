//! Cell - Atomic Unit of Simulated Memory
//!
//! Every collector works on the same cell vocabulary. A cell carries a
//! lifecycle state, a survival counter and the space it belongs to.
//!
//! Cell Lifecycle:
//! ```text
//! Free ──▶ Referenced ──▶ Marked ──▶ Survived ──▶ Marked ──▶ ...
//!              │                        │
//!              ▼                        ▼
//!         Dereferenced ──────────────▶ Free
//!
//! Copying is transient: a relocated cell is Copying until the
//! continuation that follows the hold resolves it to Survived.
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Unallocated
    Free,
    /// Allocated and reachable by the mutator
    Referenced,
    /// Allocated but no longer reachable (garbage)
    Dereferenced,
    /// Flagged live by the current mark phase
    Marked,
    /// Live object that has survived at least one collection
    Survived,
    /// Destination of an in-flight copy
    Copying,
}

impl CellState {
    /// All states in display order
    pub const ALL: [CellState; 6] = [
        CellState::Free,
        CellState::Referenced,
        CellState::Dereferenced,
        CellState::Marked,
        CellState::Survived,
        CellState::Copying,
    ];

    /// Whether the cell counts toward occupancy
    ///
    /// Occupied = Referenced ∪ Survived ∪ Marked.
    pub fn is_occupied(self) -> bool {
        matches!(
            self,
            CellState::Referenced | CellState::Survived | CellState::Marked
        )
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            CellState::Free => "free",
            CellState::Referenced => "referenced",
            CellState::Dereferenced => "dereferenced",
            CellState::Marked => "marked",
            CellState::Survived => "survived",
            CellState::Copying => "copying",
        }
    }
}

/// Space membership of a cell
///
/// Which tags appear depends on the collector: mark-sweep uses `Heap`,
/// copying uses `From`/`To`, generational uses the four generation tags and
/// the region-based collector tags each cell with its region id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceTag {
    /// Single free-floating heap
    Heap,
    /// First semispace
    From,
    /// Second semispace
    To,
    /// Nursery
    Eden,
    /// First survivor space
    Survivor0,
    /// Second survivor space
    Survivor1,
    /// Old generation
    Tenured,
    /// Region with the given id
    Region(usize),
}

/// MemoryCell - one slot of the simulated heap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCell {
    /// Stable id, unique within the heap (equal to the cell's index)
    pub id: usize,
    /// Current lifecycle state
    pub state: CellState,
    /// Number of collections this object has survived
    pub survived_cycles: u32,
    /// Space membership
    pub space: SpaceTag,
}

impl MemoryCell {
    /// Create a free cell
    pub fn new(id: usize, space: SpaceTag) -> Self {
        Self {
            id,
            state: CellState::Free,
            survived_cycles: 0,
            space,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == CellState::Free
    }

    /// Whether the mark phase treats this cell as live
    ///
    /// Liveness is a per-cell flag, not reachability: every Referenced cell
    /// and every Survived cell with a positive survival counter is live.
    pub fn is_markable(&self) -> bool {
        match self.state {
            CellState::Referenced => true,
            CellState::Survived => self.survived_cycles > 0,
            _ => false,
        }
    }

    /// Return the cell to Free, resetting its counter
    pub fn release(&mut self) {
        self.state = CellState::Free;
        self.survived_cycles = 0;
    }

    /// Allocate a fresh object in this cell
    pub fn allocate(&mut self) {
        self.state = CellState::Referenced;
        self.survived_cycles = 0;
    }
}
