//! Configuration Module - Simulation Parameters
//!
//! Supplied by the caller, read-only to the engine, and only effective on
//! (re)initialization.

use crate::gc::CollectorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Grid sizes offered to the caller
pub const GRID_SIZE_PRESETS: [usize; 5] = [10, 12, 15, 18, 20];

/// Tick intervals offered to the caller
pub const TICK_INTERVAL_PRESETS_MS: [u64; 5] = [500, 1000, 1500, 2000, 3000];

/// Largest accepted grid side
pub const MAX_GRID_SIZE: usize = 64;

/// Main configuration for the simulator
///
/// # Examples
///
/// ```rust
/// use gcsim::{CollectorKind, SimConfig};
///
/// let config = SimConfig {
///     collector: CollectorKind::Generational,
///     grid_size: 12,
///     tenure_threshold: 2,
///     seed: Some(7),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Collector strategy to simulate
    ///
    /// Default: mark-sweep
    pub collector: CollectorKind,

    /// Side of the cell grid (mark-sweep, copying, generational)
    ///
    /// The heap holds `grid_size²` cells.
    /// Default: 15
    pub grid_size: usize,

    /// Regions per side (region-based)
    ///
    /// Default: 4
    pub region_grid: usize,

    /// Cells per region side (region-based)
    ///
    /// Each region holds `region_size²` cells.
    /// Default: 4
    pub region_size: usize,

    /// Auto-run tick interval in milliseconds
    ///
    /// Default: 1000
    pub tick_interval_ms: u64,

    /// Visual hold after marking, copying and evacuation phases
    ///
    /// Independent of the tick interval.
    /// Default: 1000
    pub hold_ms: u64,

    /// Survivor copies before promotion to tenured (generational)
    ///
    /// Default: 3
    pub tenure_threshold: u32,

    /// Cap on simultaneously Eden-typed regions (region-based)
    ///
    /// Default: 4
    pub max_eden_regions: usize,

    /// Seed for the churn random source
    ///
    /// `None` seeds from entropy.
    /// Default: None
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            collector: CollectorKind::MarkSweep,
            grid_size: 15,
            region_grid: 4,
            region_size: 4,
            tick_interval_ms: 1000,
            hold_ms: 1000,
            tenure_threshold: 3,
            max_eden_regions: 4,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Default configuration for a collector
    pub fn for_collector(collector: CollectorKind) -> Self {
        Self {
            collector,
            ..Default::default()
        }
    }

    /// Validate configuration
    ///
    /// Layouts too small to seed every region type are accepted; they
    /// surface as `NoAvailableSource` when a phase needs the missing region.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector == CollectorKind::RegionBased {
            if self.region_grid == 0 || self.region_size == 0 {
                return Err(ConfigError::InvalidRegionLayout(
                    "region_grid and region_size must be > 0".to_string(),
                ));
            }
            if self.region_grid * self.region_size > MAX_GRID_SIZE {
                return Err(ConfigError::InvalidRegionLayout(format!(
                    "region_grid * region_size must be <= {}",
                    MAX_GRID_SIZE
                )));
            }
            if self.max_eden_regions == 0 {
                return Err(ConfigError::InvalidEdenCap(
                    "max_eden_regions must be > 0".to_string(),
                ));
            }
        } else {
            let min = self.collector.min_grid_size();
            if self.grid_size < min || self.grid_size > MAX_GRID_SIZE {
                return Err(ConfigError::InvalidGridSize(format!(
                    "grid_size for {} must be between {} and {}",
                    self.collector, min, MAX_GRID_SIZE
                )));
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }

        if self.hold_ms == 0 {
            return Err(ConfigError::InvalidInterval(
                "hold_ms must be > 0".to_string(),
            ));
        }

        if self.tenure_threshold == 0 {
            return Err(ConfigError::InvalidThreshold(
                "tenure_threshold must be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Layer environment variables over this configuration
    ///
    /// Recognised variables:
    /// - GCSIM_COLLECTOR
    /// - GCSIM_GRID_SIZE
    /// - GCSIM_TICK_MS
    /// - GCSIM_HOLD_MS
    /// - GCSIM_TENURE_THRESHOLD
    /// - GCSIM_SEED
    ///
    /// Unparseable values are ignored.
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env`](Self::with_env) with an explicit variable lookup
    pub fn with_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("GCSIM_COLLECTOR").and_then(|v| v.parse().ok()) {
            self.collector = kind;
        }
        if let Some(size) = lookup("GCSIM_GRID_SIZE").and_then(|v| v.parse().ok()) {
            self.grid_size = size;
        }
        if let Some(ms) = lookup("GCSIM_TICK_MS").and_then(|v| v.parse().ok()) {
            self.tick_interval_ms = ms;
        }
        if let Some(ms) = lookup("GCSIM_HOLD_MS").and_then(|v| v.parse().ok()) {
            self.hold_ms = ms;
        }
        if let Some(threshold) = lookup("GCSIM_TENURE_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.tenure_threshold = threshold;
        }
        if let Some(seed) = lookup("GCSIM_SEED").and_then(|v| v.parse().ok()) {
            self.seed = Some(seed);
        }
        self
    }

    /// Total cells the configured layout will hold
    pub fn total_cells(&self) -> usize {
        match self.collector {
            CollectorKind::RegionBased => {
                let side = self.region_grid * self.region_size;
                side * side
            }
            _ => self.grid_size * self.grid_size,
        }
    }
}

/// Partial configuration accepted by `configure`
///
/// Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub collector: Option<CollectorKind>,
    pub grid_size: Option<usize>,
    pub region_grid: Option<usize>,
    pub region_size: Option<usize>,
    pub tick_interval_ms: Option<u64>,
    pub hold_ms: Option<u64>,
    pub tenure_threshold: Option<u32>,
    pub max_eden_regions: Option<usize>,
    pub seed: Option<u64>,
}

impl ConfigPatch {
    /// Produce a new configuration with this patch applied
    pub fn apply(&self, base: &SimConfig) -> SimConfig {
        SimConfig {
            collector: self.collector.unwrap_or(base.collector),
            grid_size: self.grid_size.unwrap_or(base.grid_size),
            region_grid: self.region_grid.unwrap_or(base.region_grid),
            region_size: self.region_size.unwrap_or(base.region_size),
            tick_interval_ms: self.tick_interval_ms.unwrap_or(base.tick_interval_ms),
            hold_ms: self.hold_ms.unwrap_or(base.hold_ms),
            tenure_threshold: self.tenure_threshold.unwrap_or(base.tenure_threshold),
            max_eden_regions: self.max_eden_regions.unwrap_or(base.max_eden_regions),
            seed: self.seed.or(base.seed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ConfigPatch::default()
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid grid size: {0}")]
    InvalidGridSize(String),

    #[error("Invalid region layout: {0}")]
    InvalidRegionLayout(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid eden region cap: {0}")]
    InvalidEdenCap(String),
}
