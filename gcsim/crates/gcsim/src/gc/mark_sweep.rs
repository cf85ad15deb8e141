//! Mark-Sweep - Non-Moving Collection
//!
//! Allocation churns the single heap space until fewer than
//! [`FREE_THRESHOLD`] cells are free. Marking then flags live cells and the
//! sweep reclaims garbage in place. Survivors never move, so fragmentation
//! is visible on the grid.

use super::{unexpected_phase, CollectorKind, CollectorStrategy, Phase, StepContext};
use crate::allocator::ChurnGenerator;
use crate::config::SimConfig;
use crate::error::Result;
use crate::heap::{find_space, CellScope, HeapState, SpaceTag};
use crate::marker::{mark_live, sweep};
use crate::stats::CycleKind;

/// Free cells below which allocation gives way to marking
pub const FREE_THRESHOLD: usize = 10;

#[derive(Debug, Clone)]
pub struct MarkSweep {
    churn: ChurnGenerator,
}

impl MarkSweep {
    pub fn new() -> Self {
        Self {
            churn: ChurnGenerator::new(CollectorKind::MarkSweep.churn_profile()),
        }
    }
}

impl Default for MarkSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorStrategy for MarkSweep {
    fn kind(&self) -> CollectorKind {
        CollectorKind::MarkSweep
    }

    fn initialize(&self, config: &SimConfig) -> HeapState {
        HeapState::mark_sweep(config.grid_size)
    }

    fn advance(&mut self, heap: &mut HeapState, ctx: &mut StepContext<'_>) -> Result<Phase> {
        let phase = heap.phase();
        let (spaces, cells) = heap.spaces_and_cells();
        let space = find_space(spaces, SpaceTag::Heap)?;

        match phase {
            Phase::Allocating => {
                if space.free_count(cells) < FREE_THRESHOLD {
                    let marked = mark_live(space, cells);
                    ctx.stats.record_marked(marked.len());
                    return Ok(Phase::Marking);
                }
                let report = self.churn.churn(space, cells, ctx.rng);
                ctx.stats.record_churn(&report);
                Ok(Phase::Allocating)
            }
            Phase::Marking => {
                let report = sweep(space, cells);
                ctx.stats.record_reclaimed(report.reclaimed);
                ctx.stats.record_cycle(CycleKind::Full);
                let cycle = heap.complete_cycle();
                log::info!(
                    "mark-sweep cycle {}: reclaimed {}, survived {}",
                    cycle,
                    report.reclaimed,
                    report.survived
                );
                Ok(Phase::Sweeping)
            }
            Phase::Sweeping => Ok(Phase::Allocating),
            other => Err(unexpected_phase(self.kind(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::PhaseDriver;
    use crate::heap::CellState;
    use crate::stats::SimStats;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run_until(
        driver: &mut PhaseDriver,
        heap: &mut HeapState,
        rng: &mut StdRng,
        stats: &mut SimStats,
        target: Phase,
    ) {
        for _ in 0..500 {
            if heap.phase() == target {
                return;
            }
            let mut ctx = StepContext {
                rng: &mut *rng,
                stats: &mut *stats,
            };
            driver.step(heap, &mut ctx).unwrap();
        }
        panic!("never reached {}", target);
    }

    #[test]
    fn test_marking_starts_below_threshold() {
        let config = SimConfig {
            grid_size: 10,
            ..Default::default()
        };
        let mut driver = PhaseDriver::new(&config);
        let mut heap = driver.initialize(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut stats = SimStats::new();

        run_until(&mut driver, &mut heap, &mut rng, &mut stats, Phase::Marking);
        assert!(heap.free_count() < FREE_THRESHOLD);
        assert_eq!(heap.count_state(CellState::Referenced), 0);
        assert_eq!(heap.gc_cycles(), 0);
    }

    #[test]
    fn test_sweep_frees_garbage_in_place() {
        let config = SimConfig {
            grid_size: 10,
            ..Default::default()
        };
        let mut driver = PhaseDriver::new(&config);
        let mut heap = driver.initialize(&config);
        let mut rng = StdRng::seed_from_u64(12);
        let mut stats = SimStats::new();

        run_until(&mut driver, &mut heap, &mut rng, &mut stats, Phase::Marking);
        let marked: Vec<usize> = heap
            .cells()
            .iter()
            .filter(|c| c.state == CellState::Marked)
            .map(|c| c.id)
            .collect();
        let garbage = heap.count_state(CellState::Dereferenced);

        run_until(&mut driver, &mut heap, &mut rng, &mut stats, Phase::Sweeping);
        assert_eq!(heap.gc_cycles(), 1);
        assert_eq!(heap.count_state(CellState::Dereferenced), 0);
        assert_eq!(heap.count_state(CellState::Marked), 0);
        assert_eq!(stats.cells_reclaimed, garbage as u64);
        // Non-moving: every marked cell survives where it was
        for id in marked {
            assert_eq!(heap.cells()[id].state, CellState::Survived);
            assert!(heap.cells()[id].survived_cycles >= 1);
        }
    }

    #[test]
    fn test_completes_after_four_cycles() {
        let config = SimConfig {
            grid_size: 10,
            ..Default::default()
        };
        let mut driver = PhaseDriver::new(&config);
        let mut heap = driver.initialize(&config);
        let mut rng = StdRng::seed_from_u64(13);
        let mut stats = SimStats::new();

        run_until(&mut driver, &mut heap, &mut rng, &mut stats, Phase::Complete);
        assert_eq!(heap.gc_cycles(), 4);
        assert_eq!(stats.total_cycles, 4);
    }
}
