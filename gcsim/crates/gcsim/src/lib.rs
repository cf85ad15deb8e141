//! # gcsim - Garbage Collection Strategy Simulator
//!
//! gcsim models a managed heap as a square grid of cells and walks it through
//! the phases of four classic collectors, one discrete step at a time. It is
//! built for teaching: every step leaves the heap in a state a renderer can
//! draw, and every phase change carries a human-readable notification.
//!
//! ## Collectors
//!
//! - **Mark-sweep**: non-moving, survivors stay in place
//! - **Copying**: two semispaces, live cells are copied and the roles swap
//! - **Generational**: eden, two survivor spaces and tenured, with minor and
//!   major collections
//! - **Region-based**: G1-style grid of retypeable regions with evacuation
//!
//! ## Quick Start
//!
//! ```rust
//! use gcsim::{CollectorKind, Phase, SimConfig, Simulator};
//!
//! let config = SimConfig {
//!     collector: CollectorKind::MarkSweep,
//!     grid_size: 10,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut sim = Simulator::new(config)?;
//! let report = sim.step()?;
//! assert_eq!(report.to, Phase::Allocating);
//!
//! let snapshot = sim.snapshot();
//! assert_eq!(snapshot.total_cells(), 100);
//! # Ok::<(), gcsim::SimError>(())
//! ```
//!
//! ## Phase Flow
//!
//! ```text
//! Mark-sweep:    Allocating -> Marking -> Sweeping -> Allocating ... -> Complete
//! Copying:       Allocating -> Marking -> Copying -> Swapping -> Allocating ... -> Complete
//! Generational:  Allocating -> Marking -> CopyingToSurvivor -> CopyingBetweenSurvivors
//!                           -> Swapping -> Allocating
//!                Allocating -> MajorGCMarking -> MajorGCCompacting -> Allocating
//! Region-based:  Allocating -> Marking -> Evacuating -> Allocating
//! ```
//!
//! Mark-sweep and copying stop in `Complete` after four cycles. Generational
//! and region-based run until reset.
//!
//! ## Scheduling
//!
//! Marking, copying, compaction and evacuation phases hold the heap for a
//! fixed delay before the next transition. A hold is identified by a
//! [`HoldHandle`]; resetting, reconfiguring or pausing invalidates it.
//!
//! ## Modules
//!
//! - [`heap`]: cells, spaces, regions and the heap state
//! - [`gc`]: phases, collector strategies and the phase driver
//! - [`allocator`]: allocation churn and tenuring policy
//! - [`marker`]: liveness marking, mortality and sweeping
//! - [`relocate`]: copying, promotion and compaction
//! - [`runtime`]: simulator, holds, clocks and the auto-run thread
//! - [`snapshot`]: read-only projection for renderers
//! - [`stats`]: cumulative counters
//! - [`logging`]: events, notifications and history
//! - [`config`]: simulation parameters
//! - [`error`]: error types

// Core simulation modules
pub mod gc;
pub mod heap;

// Phase operations
pub mod allocator;
pub mod marker;
pub mod relocate;

// Scheduling
pub mod runtime;

// Observation
pub mod logging;
pub mod snapshot;
pub mod stats;

// Configuration and errors
pub mod config;
pub mod error;

// Re-exports
pub use config::{ConfigError, ConfigPatch, SimConfig};
pub use error::{Result, SimError};
pub use gc::{CollectorKind, CollectorStrategy, Phase, PhaseDriver};
pub use heap::{CellState, HeapState, MemoryCell, RegionKind, SpaceTag};
pub use logging::{SimEvent, SimLogger, SimLoggerConfig};
pub use runtime::{
    Clock, HoldHandle, ManualClock, Runner, Simulator, StepOutcome, StepReport, SystemClock,
};
pub use snapshot::HeapSnapshot;
pub use stats::SimStats;

/// gcsim version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a simulator for a collector with default parameters
///
/// # Examples
///
/// ```rust
/// let sim = gcsim::init(gcsim::CollectorKind::Copying)?;
/// assert_eq!(sim.heap().gc_cycles(), 0);
/// # Ok::<(), gcsim::SimError>(())
/// ```
pub fn init(collector: CollectorKind) -> Result<Simulator> {
    Simulator::new(SimConfig::for_collector(collector))
}
