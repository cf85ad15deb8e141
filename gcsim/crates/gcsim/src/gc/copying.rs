//! Copying - Two-Space Collection
//!
//! Only the active semispace allocates. When it runs low, live cells are
//! marked, copied in order into the inactive space (aging by one), the
//! active space is wiped, and the two spaces exchange roles. Copies that
//! do not fit are dropped and counted as overflow.

use super::{unexpected_phase, CollectorKind, CollectorStrategy, Phase, StepContext};
use crate::allocator::ChurnGenerator;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::heap::{find_space, CellScope, CellState, HeapState, SemiSpace};
use crate::marker::mark_live;
use crate::relocate::{copy_all, resolve_copies, FreeCursor};
use crate::stats::CycleKind;

/// Free cells in the active space below which allocation stops
pub const ACTIVE_FREE_THRESHOLD: usize = 5;

#[derive(Debug, Clone)]
pub struct Copying {
    churn: ChurnGenerator,
}

impl Copying {
    pub fn new() -> Self {
        Self {
            churn: ChurnGenerator::new(CollectorKind::Copying.churn_profile()),
        }
    }
}

impl Default for Copying {
    fn default() -> Self {
        Self::new()
    }
}

fn active_of(heap: &HeapState) -> Result<SemiSpace> {
    heap.active_space().ok_or_else(|| SimError::InvalidState {
        expected: "an active semispace".to_string(),
        actual: "none".to_string(),
    })
}

impl CollectorStrategy for Copying {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Copying
    }

    fn initialize(&self, config: &SimConfig) -> HeapState {
        HeapState::copying(config.grid_size)
    }

    fn advance(&mut self, heap: &mut HeapState, ctx: &mut StepContext<'_>) -> Result<Phase> {
        let phase = heap.phase();
        let active_side = active_of(heap)?;
        let (spaces, cells) = heap.spaces_and_cells();
        let active = find_space(spaces, active_side.tag())?;
        let inactive = find_space(spaces, active_side.other().tag())?;

        match phase {
            Phase::Allocating => {
                if active.free_count(cells) < ACTIVE_FREE_THRESHOLD {
                    let marked = mark_live(active, cells);
                    ctx.stats.record_marked(marked.len());
                    return Ok(Phase::Marking);
                }
                let report = self.churn.churn(active, cells, ctx.rng);
                ctx.stats.record_churn(&report);
                Ok(Phase::Allocating)
            }
            Phase::Marking => {
                inactive.release_all(cells);
                let sources = active.indices_in_state(cells, CellState::Marked);
                let mut dest = FreeCursor::new(inactive, cells);
                let report = copy_all(cells, &sources, &mut dest);
                ctx.stats.record_relocation(&report);
                Ok(Phase::Copying)
            }
            Phase::Copying => {
                resolve_copies(cells);
                let garbage = active.count_state(cells, CellState::Dereferenced);
                active.release_all(cells);
                ctx.stats.record_reclaimed(garbage);
                ctx.stats.record_cycle(CycleKind::Full);

                heap.flip_active_space();
                let cycle = heap.complete_cycle();
                log::info!(
                    "copying cycle {}: {:?} is now active, reclaimed {}",
                    cycle,
                    active_side.other(),
                    garbage
                );
                Ok(Phase::Swapping)
            }
            Phase::Swapping => Ok(Phase::Allocating),
            other => Err(unexpected_phase(self.kind(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::PhaseDriver;
    use crate::heap::SpaceTag;
    use crate::stats::SimStats;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Rig {
        driver: PhaseDriver,
        heap: HeapState,
        rng: StdRng,
        stats: SimStats,
    }

    impl Rig {
        fn new(grid_size: usize, seed: u64) -> Self {
            let config = SimConfig {
                collector: CollectorKind::Copying,
                grid_size,
                ..Default::default()
            };
            let driver = PhaseDriver::new(&config);
            let heap = driver.initialize(&config);
            Self {
                driver,
                heap,
                rng: StdRng::seed_from_u64(seed),
                stats: SimStats::new(),
            }
        }

        fn step(&mut self) {
            let mut ctx = StepContext {
                rng: &mut self.rng,
                stats: &mut self.stats,
            };
            self.driver.step(&mut self.heap, &mut ctx).unwrap();
        }

        fn run_until(&mut self, target: Phase) {
            for _ in 0..500 {
                if self.heap.phase() == target {
                    return;
                }
                self.step();
            }
            panic!("never reached {}", target);
        }
    }

    #[test]
    fn test_allocation_stays_in_active_space() {
        let mut rig = Rig::new(10, 21);
        rig.run_until(Phase::Marking);
        let to = rig.heap.space(SpaceTag::To).unwrap();
        assert_eq!(to.free_count(rig.heap.cells()), to.capacity());
    }

    #[test]
    fn test_copy_and_swap() {
        let mut rig = Rig::new(10, 22);
        rig.run_until(Phase::Marking);
        let marked = rig.heap.count_state(CellState::Marked);

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::Copying);
        let to = rig.heap.space(SpaceTag::To).unwrap();
        let copied = to.count_state(rig.heap.cells(), CellState::Copying);
        assert_eq!(copied, marked.min(to.capacity()));

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::Swapping);
        assert_eq!(rig.heap.active_space(), Some(SemiSpace::To));
        assert_eq!(rig.heap.gc_cycles(), 1);
        let cells = rig.heap.cells();
        let from = rig.heap.space(SpaceTag::From).unwrap();
        let to = rig.heap.space(SpaceTag::To).unwrap();
        assert_eq!(from.free_count(cells), from.capacity());
        assert_eq!(to.count_state(cells, CellState::Survived), copied);
        assert!(to
            .cell_indices()
            .iter()
            .filter(|&&i| cells[i].state == CellState::Survived)
            .all(|&i| cells[i].survived_cycles >= 1));
    }

    #[test]
    fn test_roles_alternate_each_cycle() {
        let mut rig = Rig::new(10, 23);
        rig.run_until(Phase::Swapping);
        assert_eq!(rig.heap.active_space(), Some(SemiSpace::To));
        rig.step();
        rig.run_until(Phase::Swapping);
        assert_eq!(rig.heap.active_space(), Some(SemiSpace::From));
        assert_eq!(rig.heap.gc_cycles(), 2);
    }

    #[test]
    fn test_completes_after_four_cycles() {
        let mut rig = Rig::new(10, 24);
        rig.run_until(Phase::Complete);
        assert_eq!(rig.heap.gc_cycles(), 4);
    }
}
