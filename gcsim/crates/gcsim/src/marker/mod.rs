//! Marker Module - Liveness Flags, Mortality and Sweeping
//!
//! There is no object graph. A cell is live when it is Referenced, or
//! Survived with a positive survival counter, and marking simply flags
//! those cells. The major collection is the one exception: it keeps every
//! Survived tenured cell. Generational marking first applies stochastic mortality to
//! model garbage that accumulated since the previous cycle.
//!
//! All functions work on one [`CellScope`] and never look outside it.

use crate::heap::{CellScope, CellState, MemoryCell};
use rand::seq::SliceRandom;
use rand::Rng;

/// Share of live eden cells that die before a minor mark
pub const EDEN_MORTALITY: f64 = 0.25;

/// Share of live survivor cells that die before a minor mark
pub const SURVIVOR_MORTALITY: f64 = 0.20;

/// Share of live tenured cells that die before any mark
pub const TENURED_MORTALITY: f64 = 0.12;

/// Flag every markable cell in scope as Marked
///
/// Returns the indices that were marked, in scope order.
pub fn mark_live(scope: &dyn CellScope, cells: &mut [MemoryCell]) -> Vec<usize> {
    let marked: Vec<usize> = scope
        .cell_indices()
        .iter()
        .copied()
        .filter(|&i| cells[i].is_markable())
        .collect();

    for &i in &marked {
        cells[i].state = CellState::Marked;
    }
    marked
}

/// Kill `floor(live × rate)` live cells chosen uniformly at random
///
/// Live here means Referenced or Survived. Returns the victims, sorted.
pub fn apply_mortality<R: Rng + ?Sized>(
    scope: &dyn CellScope,
    cells: &mut [MemoryCell],
    rate: f64,
    rng: &mut R,
) -> Vec<usize> {
    let live: Vec<usize> = scope
        .cell_indices()
        .iter()
        .copied()
        .filter(|&i| matches!(cells[i].state, CellState::Referenced | CellState::Survived))
        .collect();

    let amount = (live.len() as f64 * rate).floor() as usize;
    let mut victims: Vec<usize> = live.choose_multiple(rng, amount).copied().collect();
    victims.sort_unstable();

    for &i in &victims {
        cells[i].state = CellState::Dereferenced;
    }
    victims
}

/// Flag every Survived cell in scope as Marked, whatever its counter
///
/// Used by the major collection, where promotion and compaction have
/// already reset every counter.
pub fn mark_tenured(scope: &dyn CellScope, cells: &mut [MemoryCell]) -> Vec<usize> {
    let marked: Vec<usize> = scope
        .cell_indices()
        .iter()
        .copied()
        .filter(|&i| cells[i].state == CellState::Survived)
        .collect();

    for &i in &marked {
        cells[i].state = CellState::Marked;
    }
    marked
}

/// Turn Marked cells back into Survived, counting one more survival
pub fn retain_marked(scope: &dyn CellScope, cells: &mut [MemoryCell]) -> usize {
    let mut retained = 0;
    for &i in scope.cell_indices() {
        let cell = &mut cells[i];
        if cell.state == CellState::Marked {
            cell.state = CellState::Survived;
            cell.survived_cycles = cell.survived_cycles.saturating_add(1);
            retained += 1;
        }
    }
    retained
}

/// Outcome of an in-place sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Dereferenced cells returned to Free
    pub reclaimed: usize,
    /// Marked cells that became Survived
    pub survived: usize,
}

/// Non-moving reclamation
///
/// Dereferenced → Free (counter reset), Marked → Survived (counter + 1).
/// Anything else is left alone.
pub fn sweep(scope: &dyn CellScope, cells: &mut [MemoryCell]) -> SweepReport {
    let mut report = SweepReport::default();
    for &i in scope.cell_indices() {
        if cells[i].state == CellState::Dereferenced {
            cells[i].release();
            report.reclaimed += 1;
        }
    }
    report.survived = retain_marked(scope, cells);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Space, SpaceTag};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cells_with(states: &[(CellState, u32)]) -> (Vec<MemoryCell>, Space) {
        let cells = states
            .iter()
            .enumerate()
            .map(|(i, &(state, survived))| MemoryCell {
                id: i,
                state,
                survived_cycles: survived,
                space: SpaceTag::Heap,
            })
            .collect();
        let space = Space::new(SpaceTag::Heap, (0..states.len()).collect());
        (cells, space)
    }

    #[test]
    fn test_mark_live_follows_liveness_rule() {
        let (mut cells, space) = cells_with(&[
            (CellState::Referenced, 0),
            (CellState::Survived, 0),
            (CellState::Survived, 2),
            (CellState::Dereferenced, 0),
            (CellState::Free, 0),
        ]);

        let marked = mark_live(&space, &mut cells);
        assert_eq!(marked, vec![0, 2]);
        assert_eq!(cells[1].state, CellState::Survived);
        assert_eq!(cells[3].state, CellState::Dereferenced);
    }

    #[test]
    fn test_sweep_reclaims_and_ages() {
        let (mut cells, space) = cells_with(&[
            (CellState::Marked, 0),
            (CellState::Dereferenced, 3),
            (CellState::Marked, 2),
            (CellState::Free, 0),
        ]);

        let report = sweep(&space, &mut cells);
        assert_eq!(report, SweepReport { reclaimed: 1, survived: 2 });
        assert_eq!(cells[0].state, CellState::Survived);
        assert_eq!(cells[0].survived_cycles, 1);
        assert_eq!(cells[1].state, CellState::Free);
        assert_eq!(cells[1].survived_cycles, 0);
        assert_eq!(cells[2].survived_cycles, 3);
    }

    #[test]
    fn test_mortality_count_is_floored() {
        let (mut cells, space) = cells_with(&[(CellState::Referenced, 0); 9]);
        let mut rng = StdRng::seed_from_u64(5);

        let victims = apply_mortality(&space, &mut cells, EDEN_MORTALITY, &mut rng);
        assert_eq!(victims.len(), 2); // floor(9 * 0.25)
        assert_eq!(
            cells.iter().filter(|c| c.state == CellState::Dereferenced).count(),
            2
        );
    }

    #[test]
    fn test_mortality_ignores_garbage_and_free() {
        let (mut cells, space) = cells_with(&[
            (CellState::Dereferenced, 0),
            (CellState::Free, 0),
            (CellState::Marked, 1),
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(apply_mortality(&space, &mut cells, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_mark_tenured_ignores_counter() {
        let (mut cells, space) = cells_with(&[
            (CellState::Survived, 0),
            (CellState::Referenced, 0),
            (CellState::Dereferenced, 0),
            (CellState::Survived, 4),
        ]);
        assert_eq!(mark_tenured(&space, &mut cells), vec![0, 3]);
        assert_eq!(cells[0].state, CellState::Marked);
        assert_eq!(cells[0].survived_cycles, 0);
        assert_eq!(cells[1].state, CellState::Referenced);
        assert_eq!(cells[2].state, CellState::Dereferenced);
    }
}
