//! Generational - Eden, Two Survivors and Tenured
//!
//! New objects are allocated in eden only. A minor collection marks eden
//! and the survivor spaces, copies eden survivors into the active survivor
//! space, then moves older survivors across or promotes them to tenured
//! once they reach the tenure threshold. The survivor roles then swap.
//!
//! When tenured has no free cell left at the start of a collection, a
//! major collection runs instead: tenured is marked and compacted.
//!
//! Mortality before marking:
//! ```text
//! eden       25% of live cells die
//! survivors  20%
//! tenured    12%
//! ```
//!
//! Tenured cells carry a zero counter (promotion and compaction both reset
//! it), so the major mark flags every Survived tenured cell regardless of
//! its counter.

use super::{unexpected_phase, CollectorKind, CollectorStrategy, Phase, StepContext};
use crate::allocator::{ChurnGenerator, TenurePolicy};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::heap::{find_space, CellScope, CellState, HeapState, Space, SpaceTag, SurvivorSpace};
use crate::marker::{
    apply_mortality, mark_live, mark_tenured, EDEN_MORTALITY, SURVIVOR_MORTALITY,
    TENURED_MORTALITY,
};
use crate::relocate::{
    compact, copy_or_promote, promote, resolve_copies, FreeCursor, Placement, RelocationReport,
};
use crate::stats::CycleKind;

/// Free eden cells below which allocation stops
pub const EDEN_FREE_THRESHOLD: usize = 4;

#[derive(Debug, Clone)]
pub struct Generational {
    churn: ChurnGenerator,
    tenure: TenurePolicy,
}

impl Generational {
    pub fn new(tenure_threshold: u32) -> Self {
        Self {
            churn: ChurnGenerator::new(CollectorKind::Generational.churn_profile()),
            tenure: TenurePolicy::new(tenure_threshold),
        }
    }
}

/// The four generational spaces, resolved for one step
struct Generations<'a> {
    eden: &'a Space,
    active: &'a Space,
    inactive: &'a Space,
    tenured: &'a Space,
}

impl<'a> Generations<'a> {
    fn resolve(spaces: &'a [Space], active: SurvivorSpace) -> Result<Self> {
        Ok(Self {
            eden: find_space(spaces, SpaceTag::Eden)?,
            active: find_space(spaces, active.tag())?,
            inactive: find_space(spaces, active.other().tag())?,
            tenured: find_space(spaces, SpaceTag::Tenured)?,
        })
    }
}

impl CollectorStrategy for Generational {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Generational
    }

    fn initialize(&self, config: &SimConfig) -> HeapState {
        HeapState::generational(config.grid_size)
    }

    fn advance(&mut self, heap: &mut HeapState, ctx: &mut StepContext<'_>) -> Result<Phase> {
        let phase = heap.phase();
        let active_side = heap.active_survivor().ok_or_else(|| SimError::InvalidState {
            expected: "an active survivor space".to_string(),
            actual: "none".to_string(),
        })?;
        let (spaces, cells) = heap.spaces_and_cells();
        let gen = Generations::resolve(spaces, active_side)?;

        match phase {
            Phase::Allocating => {
                if gen.eden.free_count(cells) >= EDEN_FREE_THRESHOLD {
                    let report = self.churn.churn(gen.eden, cells, ctx.rng);
                    ctx.stats.record_churn(&report);
                    return Ok(Phase::Allocating);
                }

                if !gen.tenured.has_free(cells) {
                    // Major: tenured garbage accumulates, the rest is kept
                    let killed = apply_mortality(gen.tenured, cells, TENURED_MORTALITY, ctx.rng);
                    let marked = mark_tenured(gen.tenured, cells);
                    ctx.stats.record_mortality(killed.len());
                    ctx.stats.record_marked(marked.len());
                    log::info!("tenured is full, starting major collection");
                    return Ok(Phase::MajorGcMarking);
                }

                let mut killed = apply_mortality(gen.eden, cells, EDEN_MORTALITY, ctx.rng).len();
                let mut marked = mark_live(gen.eden, cells).len();
                for survivor in [gen.active, gen.inactive] {
                    killed += apply_mortality(survivor, cells, SURVIVOR_MORTALITY, ctx.rng).len();
                    marked += mark_live(survivor, cells).len();
                }
                killed += apply_mortality(gen.tenured, cells, TENURED_MORTALITY, ctx.rng).len();

                ctx.stats.record_mortality(killed);
                ctx.stats.record_marked(marked);
                Ok(Phase::Marking)
            }
            Phase::Marking => {
                let sources = gen.eden.indices_in_state(cells, CellState::Marked);
                let mut dest = FreeCursor::new(gen.active, cells);
                let mut fallback = FreeCursor::new(gen.tenured, cells);

                let mut report = RelocationReport::default();
                for source in sources {
                    report.record(copy_or_promote(cells, source, &mut dest, &mut fallback));
                }
                ctx.stats.record_relocation(&report);
                Ok(Phase::CopyingToSurvivor)
            }
            Phase::CopyingToSurvivor => {
                resolve_copies(cells);
                let garbage = gen.eden.count_state(cells, CellState::Dereferenced);
                gen.eden.release_all(cells);
                ctx.stats.record_reclaimed(garbage);

                // Dead survivors; copied ones become Dereferenced below
                let garbage = gen.inactive.count_state(cells, CellState::Dereferenced);
                ctx.stats.record_reclaimed(garbage);

                let sources = gen.inactive.indices_in_state(cells, CellState::Marked);
                let mut dest = FreeCursor::new(gen.active, cells);
                let mut tenured = FreeCursor::new(gen.tenured, cells);

                let mut report = RelocationReport::default();
                for source in sources {
                    let age = self.tenure.aged(&cells[source]);
                    let placement = if self.tenure.should_promote(age) {
                        promote(cells, &mut tenured)
                    } else {
                        copy_or_promote(cells, source, &mut dest, &mut tenured)
                    };
                    report.record(placement);
                    match placement {
                        Placement::Copied(_) => cells[source].state = CellState::Dereferenced,
                        Placement::Promoted(_) | Placement::Dropped => cells[source].release(),
                    }
                }
                ctx.stats.record_relocation(&report);
                Ok(Phase::CopyingBetweenSurvivors)
            }
            Phase::CopyingBetweenSurvivors => {
                resolve_copies(cells);
                gen.inactive.release_all(cells);
                ctx.stats.record_cycle(CycleKind::Minor);

                heap.flip_active_survivor();
                let cycle = heap.complete_cycle();
                log::info!("minor collection done, cycle {}", cycle);
                Ok(Phase::Swapping)
            }
            Phase::Swapping => Ok(Phase::Allocating),
            Phase::MajorGcMarking => {
                let report = compact(gen.tenured, cells);
                ctx.stats.record_reclaimed(report.reclaimed);
                ctx.stats.record_cycle(CycleKind::Major);

                let cycle = heap.complete_cycle();
                log::info!(
                    "major collection done, cycle {}: retained {}, reclaimed {}",
                    cycle,
                    report.retained,
                    report.reclaimed
                );
                Ok(Phase::MajorGcCompacting)
            }
            Phase::MajorGcCompacting => Ok(Phase::Allocating),
            other => Err(unexpected_phase(self.kind(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::PhaseDriver;
    use crate::heap::MemoryCell;
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
        fn new(grid_size: usize, tenure_threshold: u32, seed: u64) -> Self {
            let config = SimConfig {
                collector: CollectorKind::Generational,
                grid_size,
                tenure_threshold,
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
            for _ in 0..2000 {
                if self.heap.phase() == target {
                    return;
                }
                self.step();
            }
            panic!("never reached {}", target);
        }

        fn cells_in(&self, tag: SpaceTag) -> Vec<MemoryCell> {
            let space = self.heap.space(tag).unwrap();
            space
                .cell_indices()
                .iter()
                .map(|&i| self.heap.cells()[i].clone())
                .collect()
        }
    }

    #[test]
    fn test_allocation_stays_in_eden() {
        let mut rig = Rig::new(10, 3, 31);
        rig.run_until(Phase::Marking);
        for tag in [SpaceTag::Survivor0, SpaceTag::Survivor1, SpaceTag::Tenured] {
            assert!(rig.cells_in(tag).iter().all(|c| c.is_free()));
        }
    }

    #[test]
    fn test_minor_cycle_swaps_survivors_and_clears_eden() {
        let mut rig = Rig::new(10, 3, 32);
        rig.run_until(Phase::Marking);
        assert_eq!(rig.heap.active_survivor(), Some(SurvivorSpace::S0));

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::CopyingToSurvivor);
        rig.step();
        assert_eq!(rig.heap.phase(), Phase::CopyingBetweenSurvivors);
        assert!(rig.cells_in(SpaceTag::Eden).iter().all(|c| c.is_free()));

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::Swapping);
        assert_eq!(rig.heap.active_survivor(), Some(SurvivorSpace::S1));
        assert_eq!(rig.heap.gc_cycles(), 1);
        assert_eq!(rig.heap.count_state(CellState::Copying), 0);
        assert_eq!(rig.heap.count_state(CellState::Marked), 0);

        // Eden survivors landed in S0 with one survival each
        let s0 = rig.cells_in(SpaceTag::Survivor0);
        assert!(s0
            .iter()
            .filter(|c| !c.is_free())
            .all(|c| c.state == CellState::Survived && c.survived_cycles == 1));
        assert!(rig.cells_in(SpaceTag::Survivor1).iter().all(|c| c.is_free()));
    }

    #[test]
    fn test_survivors_promote_at_threshold() {
        const THRESHOLD: u32 = 2;
        let mut rig = Rig::new(15, THRESHOLD, 33);
        while rig.stats.cells_promoted == 0 && rig.stats.minor_cycles < 20 {
            rig.run_until(Phase::CopyingBetweenSurvivors);
            let active = rig.heap.active_survivor().unwrap().tag();
            assert!(rig
                .cells_in(active)
                .iter()
                .filter(|c| !c.is_free())
                .all(|c| c.survived_cycles < THRESHOLD));
            assert!(rig
                .cells_in(SpaceTag::Tenured)
                .iter()
                .filter(|c| c.state == CellState::Copying)
                .all(|c| c.survived_cycles == 0));
            rig.step();
        }
        assert!(rig.stats.cells_promoted > 0);
        assert!(rig
            .cells_in(SpaceTag::Tenured)
            .iter()
            .any(|c| c.state == CellState::Survived));
    }

    #[test]
    fn test_major_collection_compacts_full_tenured() {
        let mut rig = Rig::new(10, 3, 34);
        let tenured: Vec<usize> = rig.heap.space(SpaceTag::Tenured).unwrap().cell_indices().to_vec();
        for (n, &i) in tenured.iter().enumerate() {
            let cell = &mut rig.heap.cells_mut()[i];
            cell.state = if n % 3 == 0 {
                CellState::Dereferenced
            } else {
                CellState::Survived
            };
            cell.survived_cycles = 0;
        }
        let eden: Vec<usize> = rig.heap.space(SpaceTag::Eden).unwrap().cell_indices().to_vec();
        for &i in &eden {
            rig.heap.cells_mut()[i].allocate();
        }

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::MajorGcMarking);
        let live = rig
            .cells_in(SpaceTag::Tenured)
            .iter()
            .filter(|c| c.state == CellState::Marked)
            .count();
        assert!(rig.cells_in(SpaceTag::Tenured).iter().all(|c| c.state != CellState::Survived));

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::MajorGcCompacting);
        assert_eq!(rig.heap.gc_cycles(), 1);
        assert_eq!(rig.stats.major_cycles, 1);

        let after = rig.cells_in(SpaceTag::Tenured);
        assert!(after[..live]
            .iter()
            .all(|c| c.state == CellState::Survived && c.survived_cycles == 0));
        assert!(after[live..].iter().all(|c| c.is_free()));

        rig.step();
        assert_eq!(rig.heap.phase(), Phase::Allocating);
    }

    #[test]
    fn test_minor_cycles_leave_tenured_counters_alone() {
        let mut rig = Rig::new(10, 3, 35);
        let tenured: Vec<usize> = rig.heap.space(SpaceTag::Tenured).unwrap().cell_indices().to_vec();
        for &i in &tenured[..5] {
            rig.heap.cells_mut()[i].state = CellState::Survived;
        }

        while rig.stats.minor_cycles < 3 {
            rig.step();
        }
        assert_eq!(rig.stats.major_cycles, 0);
        assert!(rig
            .cells_in(SpaceTag::Tenured)
            .iter()
            .filter(|c| !c.is_free())
            .all(|c| c.survived_cycles == 0));
    }

    #[test]
    fn test_promoted_survivor_sources_are_freed() {
        const THRESHOLD: u32 = 3;
        let mut rig = Rig::new(10, THRESHOLD, 36);
        rig.run_until(Phase::Marking);
        assert_eq!(rig.heap.active_survivor(), Some(SurvivorSpace::S0));

        // Nothing leaves eden, so the active survivor has room for everyone
        let eden: Vec<usize> = rig.heap.space(SpaceTag::Eden).unwrap().cell_indices().to_vec();
        for &i in &eden {
            if rig.heap.cells()[i].state == CellState::Marked {
                rig.heap.cells_mut()[i].state = CellState::Dereferenced;
            }
        }
        let inactive: Vec<usize> = rig.heap.space(SpaceTag::Survivor1).unwrap().cell_indices().to_vec();
        let (old, young) = ((inactive[0], inactive[1]), inactive[2]);
        for (i, cycles) in [(old.0, THRESHOLD - 1), (old.1, THRESHOLD - 1), (young, 0)] {
            let cell = &mut rig.heap.cells_mut()[i];
            cell.state = CellState::Marked;
            cell.survived_cycles = cycles;
        }

        rig.step();
        rig.step();
        assert_eq!(rig.heap.phase(), Phase::CopyingBetweenSurvivors);

        let cells = rig.heap.cells();
        for i in [old.0, old.1] {
            assert!(cells[i].is_free(), "promoted source {} not freed", i);
            assert_eq!(cells[i].survived_cycles, 0);
        }
        assert_eq!(cells[young].state, CellState::Dereferenced);
        assert_eq!(rig.stats.cells_promoted, 2);

        let fresh_tenured = rig
            .cells_in(SpaceTag::Tenured)
            .iter()
            .filter(|c| c.state == CellState::Copying && c.survived_cycles == 0)
            .count();
        assert_eq!(fresh_tenured, 2);
        assert!(rig
            .cells_in(SpaceTag::Survivor0)
            .iter()
            .any(|c| c.state == CellState::Copying && c.survived_cycles == 1));
    }
}
