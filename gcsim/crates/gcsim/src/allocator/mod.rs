//! Allocator Module - Randomized Allocation Churn
//!
//! Mutator activity is approximated by churn: each allocation round marks a
//! bounded random number of free cells Referenced, then drops a bounded
//! random number of Referenced cells of the same scope to Dereferenced.
//!
//! Each collector has its own profile, which is what gives them different
//! mortality rates:
//!
//! | Collector      | Allocate | De-reference |
//! |----------------|----------|--------------|
//! | mark-sweep     | 3–5      | 0–2          |
//! | copying        | 2–4      | 0–2          |
//! | generational   | 4–6      | 2–5          |
//! | region-based   | 3–5      | 1–3          |

pub mod churn;
pub mod generational;

pub use churn::ChurnGenerator;
pub use generational::TenurePolicy;

use std::ops::RangeInclusive;

/// ChurnProfile - bounds for one allocation round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurnProfile {
    /// Cells to allocate
    pub allocate: RangeInclusive<usize>,
    /// Referenced cells to drop
    pub dereference: RangeInclusive<usize>,
}

impl ChurnProfile {
    pub const fn new(allocate: RangeInclusive<usize>, dereference: RangeInclusive<usize>) -> Self {
        Self {
            allocate,
            dereference,
        }
    }

    /// Low churn, most objects live on
    pub const fn mark_sweep() -> Self {
        Self::new(3..=5, 0..=2)
    }

    pub const fn copying() -> Self {
        Self::new(2..=4, 0..=2)
    }

    /// High churn, most eden objects die young
    pub const fn generational() -> Self {
        Self::new(4..=6, 2..=5)
    }

    pub const fn regional() -> Self {
        Self::new(3..=5, 1..=3)
    }
}

/// Result of one churn round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChurnReport {
    /// Indices newly set Referenced
    pub allocated: Vec<usize>,
    /// Indices newly set Dereferenced
    pub dereferenced: Vec<usize>,
}

impl ChurnReport {
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty() && self.dereferenced.is_empty()
    }
}
