//! Region-Based - G1-Style Collection over Retypeable Regions
//!
//! The heap is a grid of fixed-size regions. Allocation fills Eden-typed
//! regions, claiming an Unassigned region as Eden whenever every current
//! Eden region is full and the eden cap allows it. Once the cap is reached
//! (or no Unassigned region is left) all regions are marked, and the
//! evacuation copies live eden cells into the SurvivorTo region. Evacuated
//! Eden regions are cleared and handed back as Unassigned.

use super::{unexpected_phase, CollectorKind, CollectorStrategy, Phase, StepContext};
use crate::allocator::ChurnGenerator;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::heap::{CellScope, CellState, HeapState, MemoryCell, Region, RegionKind};
use crate::marker::{mark_live, retain_marked};
use crate::relocate::{copy_all, resolve_copies, FreeCursor};
use crate::stats::CycleKind;

#[derive(Debug, Clone)]
pub struct RegionBased {
    churn: ChurnGenerator,
    max_eden_regions: usize,
}

impl RegionBased {
    pub fn new(max_eden_regions: usize) -> Self {
        Self {
            churn: ChurnGenerator::new(CollectorKind::RegionBased.churn_profile()),
            max_eden_regions: max_eden_regions.max(1),
        }
    }

    /// Region that receives the next allocation round, claiming one if needed
    fn allocation_target(&self, regions: &mut [Region], cells: &[MemoryCell]) -> Option<usize> {
        if let Some(i) = regions
            .iter()
            .position(|r| r.is(RegionKind::Eden) && r.has_free(cells))
        {
            return Some(i);
        }

        let eden = regions.iter().filter(|r| r.is(RegionKind::Eden)).count();
        if eden >= self.max_eden_regions {
            return None;
        }
        let claimed = regions.iter().position(|r| r.is(RegionKind::Unassigned))?;
        regions[claimed].retype(RegionKind::Eden);
        Some(claimed)
    }
}

impl CollectorStrategy for RegionBased {
    fn kind(&self) -> CollectorKind {
        CollectorKind::RegionBased
    }

    fn initialize(&self, config: &SimConfig) -> HeapState {
        HeapState::regional(config.region_grid, config.region_size)
    }

    fn advance(&mut self, heap: &mut HeapState, ctx: &mut StepContext<'_>) -> Result<Phase> {
        match heap.phase() {
            Phase::Allocating => {
                let (regions, cells) = heap.regions_and_cells();
                let next = match self.allocation_target(regions, cells) {
                    Some(target) => {
                        let report = self.churn.churn(&regions[target], cells, ctx.rng);
                        ctx.stats.record_churn(&report);
                        Phase::Allocating
                    }
                    None => {
                        let marked: usize = regions.iter().map(|r| mark_live(r, cells).len()).sum();
                        ctx.stats.record_marked(marked);
                        Phase::Marking
                    }
                };
                heap.sync_eden_region_count();
                Ok(next)
            }
            Phase::Marking => {
                let (regions, cells) = heap.regions_and_cells();
                let survivor_to = regions
                    .iter()
                    .position(|r| r.is(RegionKind::SurvivorTo))
                    .ok_or_else(|| SimError::NoAvailableSource {
                        space: format!("{:?} region", RegionKind::SurvivorTo),
                    })?;

                let eden: Vec<usize> = regions
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.is(RegionKind::Eden))
                    .map(|(i, _)| i)
                    .collect();
                let sources: Vec<usize> = eden
                    .iter()
                    .flat_map(|&i| regions[i].indices_in_state(cells, CellState::Marked))
                    .collect();

                let mut dest = FreeCursor::new(&regions[survivor_to], cells);
                let report = copy_all(cells, &sources, &mut dest);
                ctx.stats.record_relocation(&report);

                let mut garbage = 0;
                for &i in &eden {
                    garbage += regions[i].count_state(cells, CellState::Dereferenced);
                    regions[i].release_all(cells);
                    regions[i].retype(RegionKind::Unassigned);
                }
                ctx.stats.record_reclaimed(garbage);

                // Live cells outside eden stay put and count one more survival
                for region in regions.iter() {
                    retain_marked(region, cells);
                }
                ctx.stats.record_cycle(CycleKind::Minor);

                heap.sync_eden_region_count();
                let cycle = heap.complete_cycle();
                log::info!(
                    "evacuation {}: {} regions freed, {} cells copied",
                    cycle,
                    eden.len(),
                    report.copied
                );
                Ok(Phase::Evacuating)
            }
            Phase::Evacuating => {
                resolve_copies(heap.cells_mut());
                Ok(Phase::Allocating)
            }
            other => Err(unexpected_phase(self.kind(), other)),
        }
    }
}
