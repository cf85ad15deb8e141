//! Relocate Module - Copying, Promotion and Evacuation
//!
//! Live cells are relocated by writing a `Copying` cell at the destination.
//! Sources are left as they are; the collector clears the source space in
//! a later step. `Copying` cells resolve to `Survived` in the continuation
//! that follows the hold.
//!
//! Destinations are consumed in scope order through a [`FreeCursor`]. A
//! live cell that finds no destination is dropped and counted as a capacity
//! overflow. The model keeps every cell; only the object is lost.

pub mod compaction;

pub use compaction::{compact, CompactionReport};

use crate::heap::{CellScope, CellState, MemoryCell};

/// FreeCursor - ordered supply of destination cells
///
/// Snapshot of a scope's free cells taken when the cursor is built.
#[derive(Debug, Clone, Default)]
pub struct FreeCursor {
    slots: Vec<usize>,
    next: usize,
}

impl FreeCursor {
    pub fn new(scope: &dyn CellScope, cells: &[MemoryCell]) -> Self {
        Self {
            slots: scope.free_indices(cells),
            next: 0,
        }
    }

    /// Cursor with no capacity
    pub fn empty() -> Self {
        Self::default()
    }

    /// Claim the next free destination
    pub fn take(&mut self) -> Option<usize> {
        let slot = self.slots.get(self.next).copied();
        if slot.is_some() {
            self.next += 1;
        }
        slot
    }

    pub fn remaining(&self) -> usize {
        self.slots.len() - self.next
    }
}

/// Where a relocated object ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Copied within its generation, at this index
    Copied(usize),
    /// Promoted to tenured, at this index
    Promoted(usize),
    /// No destination had room
    Dropped,
}

/// Totals of a relocation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationReport {
    pub copied: usize,
    pub promoted: usize,
    /// Objects dropped for lack of a destination
    pub overflowed: usize,
}

impl RelocationReport {
    pub fn record(&mut self, placement: Placement) {
        match placement {
            Placement::Copied(_) => self.copied += 1,
            Placement::Promoted(_) => self.promoted += 1,
            Placement::Dropped => self.overflowed += 1,
        }
    }

    /// Objects that reached a destination
    pub fn relocated(&self) -> usize {
        self.copied + self.promoted
    }
}

/// Write an in-flight copy with the given counter at the next destination
pub fn place(cells: &mut [MemoryCell], dest: &mut FreeCursor, survived_cycles: u32) -> Option<usize> {
    let slot = dest.take()?;
    let cell = &mut cells[slot];
    cell.state = CellState::Copying;
    cell.survived_cycles = survived_cycles;
    Some(slot)
}

/// Copy one object, aging it; fall back to promotion when `dest` is full
pub fn copy_or_promote(
    cells: &mut [MemoryCell],
    source: usize,
    dest: &mut FreeCursor,
    fallback: &mut FreeCursor,
) -> Placement {
    let age = cells[source].survived_cycles.saturating_add(1);
    if let Some(slot) = place(cells, dest, age) {
        return Placement::Copied(slot);
    }
    promote(cells, fallback)
}

/// Promote one object to tenured with its counter reset
pub fn promote(cells: &mut [MemoryCell], tenured: &mut FreeCursor) -> Placement {
    match place(cells, tenured, 0) {
        Some(slot) => Placement::Promoted(slot),
        None => Placement::Dropped,
    }
}

/// Copy every source into `dest` in order, aging each object by one
///
/// Sources beyond the destination's capacity are dropped.
pub fn copy_all(cells: &mut [MemoryCell], sources: &[usize], dest: &mut FreeCursor) -> RelocationReport {
    let mut report = RelocationReport::default();
    for &source in sources {
        let age = cells[source].survived_cycles.saturating_add(1);
        let placement = match place(cells, dest, age) {
            Some(slot) => Placement::Copied(slot),
            None => Placement::Dropped,
        };
        report.record(placement);
    }
    report
}

/// Resolve every in-flight copy in the heap to Survived
pub fn resolve_copies(cells: &mut [MemoryCell]) -> usize {
    let mut resolved = 0;
    for cell in cells.iter_mut().filter(|c| c.state == CellState::Copying) {
        cell.state = CellState::Survived;
        resolved += 1;
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Space, SpaceTag};

    fn heap(n: usize) -> Vec<MemoryCell> {
        (0..n).map(|i| MemoryCell::new(i, SpaceTag::Heap)).collect()
    }

    #[test]
    fn test_cursor_walks_free_cells_in_order() {
        let mut cells = heap(6);
        cells[3].state = CellState::Survived;
        let space = Space::new(SpaceTag::To, vec![2, 3, 4]);
        let mut cursor = FreeCursor::new(&space, &cells);

        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.take(), Some(2));
        assert_eq!(cursor.take(), Some(4));
        assert_eq!(cursor.take(), None);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_copy_all_counts_overflow() {
        let mut cells = heap(6);
        for i in 0..3 {
            cells[i].state = CellState::Marked;
            cells[i].survived_cycles = i as u32;
        }
        let to = Space::new(SpaceTag::To, vec![4, 5]);
        let mut dest = FreeCursor::new(&to, &cells);

        let report = copy_all(&mut cells, &[0, 1, 2], &mut dest);
        assert_eq!(report.copied, 2);
        assert_eq!(report.overflowed, 1);
        assert_eq!(cells[4].state, CellState::Copying);
        assert_eq!(cells[4].survived_cycles, 1);
        assert_eq!(cells[5].survived_cycles, 2);
        // Sources untouched
        assert_eq!(cells[0].state, CellState::Marked);
    }

    #[test]
    fn test_copy_or_promote_falls_back() {
        let mut cells = heap(4);
        cells[0].state = CellState::Marked;
        cells[0].survived_cycles = 5;
        let tenured = Space::new(SpaceTag::Tenured, vec![3]);
        let mut full = FreeCursor::empty();
        let mut old = FreeCursor::new(&tenured, &cells);

        let placement = copy_or_promote(&mut cells, 0, &mut full, &mut old);
        assert_eq!(placement, Placement::Promoted(3));
        assert_eq!(cells[3].survived_cycles, 0);

        let placement = copy_or_promote(&mut cells, 0, &mut full, &mut old);
        assert_eq!(placement, Placement::Dropped);
    }

    #[test]
    fn test_resolve_copies() {
        let mut cells = heap(3);
        cells[1].state = CellState::Copying;
        cells[1].survived_cycles = 2;
        assert_eq!(resolve_copies(&mut cells), 1);
        assert_eq!(cells[1].state, CellState::Survived);
        assert_eq!(cells[1].survived_cycles, 2);
    }
}
