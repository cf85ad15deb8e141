//! Churn Generator - Allocation and De-reference Rounds
//!
//! Allocation takes free cells in scope order (sequential first). The
//! de-reference pass then samples uniformly without replacement from the
//! Referenced cells of the same scope, newly allocated ones included.

use super::{ChurnProfile, ChurnReport};
use crate::heap::{CellScope, CellState, MemoryCell};
use rand::seq::SliceRandom;
use rand::Rng;

/// ChurnGenerator - applies a [`ChurnProfile`] to one scope
#[derive(Debug, Clone)]
pub struct ChurnGenerator {
    profile: ChurnProfile,
}

impl ChurnGenerator {
    pub fn new(profile: ChurnProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ChurnProfile {
        &self.profile
    }

    /// Run one allocation round inside `scope`
    ///
    /// Never touches a cell outside the scope. Allocation stops early when
    /// the scope runs out of free cells.
    pub fn churn<R: Rng + ?Sized>(
        &self,
        scope: &dyn CellScope,
        cells: &mut [MemoryCell],
        rng: &mut R,
    ) -> ChurnReport {
        let allocated = self.allocate(scope, cells, rng);
        let dereferenced = self.dereference(scope, cells, rng);

        log::debug!(
            "churn: allocated {} cells, dereferenced {} cells",
            allocated.len(),
            dereferenced.len()
        );

        ChurnReport {
            allocated,
            dereferenced,
        }
    }

    /// Allocate a random count of free cells in scope order
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        scope: &dyn CellScope,
        cells: &mut [MemoryCell],
        rng: &mut R,
    ) -> Vec<usize> {
        let wanted = rng.gen_range(self.profile.allocate.clone());
        let targets: Vec<usize> = scope
            .free_indices(cells)
            .into_iter()
            .take(wanted)
            .collect();

        for &i in &targets {
            cells[i].allocate();
        }
        targets
    }

    /// Drop a random count of Referenced cells to Dereferenced
    ///
    /// The count is clamped to the Referenced population.
    pub fn dereference<R: Rng + ?Sized>(
        &self,
        scope: &dyn CellScope,
        cells: &mut [MemoryCell],
        rng: &mut R,
    ) -> Vec<usize> {
        let referenced = scope.indices_in_state(cells, CellState::Referenced);
        let wanted = rng.gen_range(self.profile.dereference.clone());
        let amount = wanted.min(referenced.len());

        let mut victims: Vec<usize> = referenced.choose_multiple(rng, amount).copied().collect();
        victims.sort_unstable();

        for &i in &victims {
            cells[i].state = CellState::Dereferenced;
        }
        victims
    }
}
