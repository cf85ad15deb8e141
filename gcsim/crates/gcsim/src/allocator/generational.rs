//! Tenure Policy - Survivor Ageing and Promotion
//!
//! Based on the observation that:
//! - Most objects die young
//! - Objects that survive tend to live long
//!
//! A survivor's counter is incremented on every survivor-to-survivor copy;
//! once it reaches the threshold the object is promoted to tenured and its
//! counter starts again from zero.

use crate::heap::MemoryCell;

/// TenurePolicy - decides promotion from survival counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenurePolicy {
    threshold: u32,
}

impl TenurePolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Counter value after surviving one more copy
    pub fn aged(&self, cell: &MemoryCell) -> u32 {
        cell.survived_cycles.saturating_add(1)
    }

    /// Check if an object with the given (already incremented) age is promoted
    pub fn should_promote(&self, age: u32) -> bool {
        age >= self.threshold
    }
}
