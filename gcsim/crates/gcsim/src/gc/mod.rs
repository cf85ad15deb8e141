//! GC Module - Collector Strategies and the Phase Driver
//!
//! Each collector is a [`CollectorStrategy`]: it builds its heap layout and
//! performs the work of one phase transition at a time. The
//! [`PhaseDriver`] wraps a strategy with the rules every collector shares:
//!
//! - A step on a `Complete` heap is a no-op
//! - The step counter advances once per step
//! - Bounded collectors stop after their cycle limit
//!
//! Phase flows:
//! ```text
//! mark-sweep     Allocating → Marking → Sweeping → Allocating
//! copying        Allocating → Marking → Copying → Swapping → Allocating
//! generational   Allocating → Marking → CopyingToSurvivor
//!                  → CopyingBetweenSurvivors → Swapping → Allocating
//!                Allocating → MajorGcMarking → MajorGcCompacting → Allocating
//! region-based   Allocating → Marking → Evacuating → Allocating
//! ```

pub mod copying;
pub mod generational;
pub mod mark_sweep;
pub mod regional;

pub use copying::Copying;
pub use generational::Generational;
pub use mark_sweep::MarkSweep;
pub use regional::RegionBased;

use crate::allocator::ChurnProfile;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::heap::HeapState;
use crate::stats::SimStats;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection phase of the heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Mutator churn, no collection in progress
    Allocating,
    Marking,
    /// Non-moving reclamation
    Sweeping,
    /// Semispace copy in flight
    Copying,
    /// Role exchange of the two spaces
    Swapping,
    /// Eden survivors moving to the active survivor space
    CopyingToSurvivor,
    /// Older survivors moving across, or promoted to tenured
    CopyingBetweenSurvivors,
    MajorGcMarking,
    MajorGcCompacting,
    /// Live eden cells moving to the SurvivorTo region
    Evacuating,
    /// Terminal, reached by bounded collectors only
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 11] = [
        Phase::Allocating,
        Phase::Marking,
        Phase::Sweeping,
        Phase::Copying,
        Phase::Swapping,
        Phase::CopyingToSurvivor,
        Phase::CopyingBetweenSurvivors,
        Phase::MajorGcMarking,
        Phase::MajorGcCompacting,
        Phase::Evacuating,
        Phase::Complete,
    ];

    /// Whether entering this phase schedules a visual hold
    pub fn holds(self) -> bool {
        matches!(
            self,
            Phase::Marking
                | Phase::Copying
                | Phase::CopyingToSurvivor
                | Phase::CopyingBetweenSurvivors
                | Phase::MajorGcMarking
                | Phase::MajorGcCompacting
                | Phase::Evacuating
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Complete
    }

    /// Whether a collection is in progress
    pub fn is_collecting(self) -> bool {
        !matches!(self, Phase::Allocating | Phase::Complete)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Allocating => "Allocating",
            Phase::Marking => "Marking",
            Phase::Sweeping => "Sweeping",
            Phase::Copying => "Copying",
            Phase::Swapping => "Swapping",
            Phase::CopyingToSurvivor => "CopyingToSurvivor",
            Phase::CopyingBetweenSurvivors => "CopyingBetweenSurvivors",
            Phase::MajorGcMarking => "MajorGCMarking",
            Phase::MajorGcCompacting => "MajorGCCompacting",
            Phase::Evacuating => "Evacuating",
            Phase::Complete => "Complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collector strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    /// Non-moving mark-sweep
    MarkSweep,
    /// Two-space copying
    Copying,
    /// Eden, two survivors and tenured
    Generational,
    /// G1-style regions
    RegionBased,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 4] = [
        CollectorKind::MarkSweep,
        CollectorKind::Copying,
        CollectorKind::Generational,
        CollectorKind::RegionBased,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollectorKind::MarkSweep => "mark-sweep",
            CollectorKind::Copying => "copying",
            CollectorKind::Generational => "generational",
            CollectorKind::RegionBased => "region-based",
        }
    }

    /// Smallest grid side whose layout gives every space at least one column
    pub fn min_grid_size(self) -> usize {
        match self {
            CollectorKind::Generational => 5,
            _ => 4,
        }
    }

    /// Completed collections after which the simulation is Complete
    ///
    /// `None` runs indefinitely.
    pub fn cycle_limit(self) -> Option<u64> {
        match self {
            CollectorKind::MarkSweep | CollectorKind::Copying => Some(4),
            CollectorKind::Generational | CollectorKind::RegionBased => None,
        }
    }

    pub fn churn_profile(self) -> ChurnProfile {
        match self {
            CollectorKind::MarkSweep => ChurnProfile::mark_sweep(),
            CollectorKind::Copying => ChurnProfile::copying(),
            CollectorKind::Generational => ChurnProfile::generational(),
            CollectorKind::RegionBased => ChurnProfile::regional(),
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectorKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "mark-sweep" | "marksweep" | "ms" => Ok(CollectorKind::MarkSweep),
            "copying" | "copy" | "semispace" => Ok(CollectorKind::Copying),
            "generational" | "gen" => Ok(CollectorKind::Generational),
            "region-based" | "regional" | "region" | "g1" => Ok(CollectorKind::RegionBased),
            other => Err(SimError::InvalidArgument(format!(
                "unknown collector '{}'",
                other
            ))),
        }
    }
}

/// Mutable context handed to a strategy for one step
pub struct StepContext<'a> {
    /// Churn and mortality source
    pub rng: &'a mut StdRng,
    pub stats: &'a mut SimStats,
}

/// CollectorStrategy - one collector's layout and phase work
pub trait CollectorStrategy: Send + fmt::Debug {
    fn kind(&self) -> CollectorKind;

    /// Build the initial heap for a validated configuration
    fn initialize(&self, config: &SimConfig) -> HeapState;

    /// Do the work of leaving `heap.phase()` and return the phase entered
    ///
    /// Errors must leave the heap untouched. Never called on `Complete`.
    fn advance(&mut self, heap: &mut HeapState, ctx: &mut StepContext<'_>) -> Result<Phase>;
}

/// Build the strategy selected by a configuration
pub fn strategy_for(config: &SimConfig) -> Box<dyn CollectorStrategy> {
    match config.collector {
        CollectorKind::MarkSweep => Box::new(MarkSweep::new()),
        CollectorKind::Copying => Box::new(Copying::new()),
        CollectorKind::Generational => Box::new(Generational::new(config.tenure_threshold)),
        CollectorKind::RegionBased => Box::new(RegionBased::new(config.max_eden_regions)),
    }
}

/// A phase change performed by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// PhaseDriver - sole mutator of the heap's phase
#[derive(Debug)]
pub struct PhaseDriver {
    strategy: Box<dyn CollectorStrategy>,
}

impl PhaseDriver {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            strategy: strategy_for(config),
        }
    }

    pub fn kind(&self) -> CollectorKind {
        self.strategy.kind()
    }

    pub fn initialize(&self, config: &SimConfig) -> HeapState {
        self.strategy.initialize(config)
    }

    /// Advance the heap by one step
    ///
    /// Returns `None` when the heap is already `Complete`. On error the
    /// heap keeps its phase and step counter.
    pub fn step(
        &mut self,
        heap: &mut HeapState,
        ctx: &mut StepContext<'_>,
    ) -> Result<Option<Transition>> {
        let from = heap.phase();
        if from.is_terminal() {
            return Ok(None);
        }

        let mut to = self.strategy.advance(heap, ctx)?;
        if to == Phase::Allocating && from != Phase::Allocating {
            if let Some(limit) = self.kind().cycle_limit() {
                if heap.gc_cycles() >= limit {
                    log::info!("{}: cycle limit {} reached", self.kind(), limit);
                    to = Phase::Complete;
                }
            }
        }

        heap.set_phase(to);
        heap.advance_step();
        ctx.stats.record_step();

        if from != to {
            log::debug!("step {}: {} -> {}", heap.current_step(), from, to);
        }
        Ok(Some(Transition { from, to }))
    }
}

/// Error for a strategy asked to leave a phase it never enters
pub(crate) fn unexpected_phase(kind: CollectorKind, phase: Phase) -> SimError {
    SimError::InvalidState {
        expected: format!("a {} phase", kind),
        actual: phase.to_string(),
    }
}
