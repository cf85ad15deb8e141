//! Hold - Cancellable Delayed Continuations
//!
//! Entering a hold phase schedules exactly one continuation. It is
//! identified by a [`HoldHandle`] that carries the epoch it was issued in.
//! Reset, reconfigure and pause bump the epoch, so a handle kept across
//! any of them can never be applied.

use crate::error::{Result, SimError};
use crate::gc::Phase;
use std::time::{Duration, Instant};

/// Ticket for a scheduled continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldHandle {
    id: u64,
    epoch: u64,
    phase: Phase,
    due: Instant,
}

impl HoldHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Phase the heap is held in
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

/// HoldSlot - at most one pending continuation
#[derive(Debug, Default)]
pub struct HoldSlot {
    next_id: u64,
    epoch: u64,
    pending: Option<HoldHandle>,
}

impl HoldSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending(&self) -> Option<HoldHandle> {
        self.pending
    }

    /// Schedule the continuation that leaves `phase`
    pub fn schedule(&mut self, phase: Phase, due: Instant) -> HoldHandle {
        self.next_id += 1;
        let handle = HoldHandle {
            id: self.next_id,
            epoch: self.epoch,
            phase,
            due,
        };
        self.pending = Some(handle);
        handle
    }

    /// Drop the pending continuation and start a new epoch
    pub fn cancel(&mut self) -> Option<HoldHandle> {
        self.epoch += 1;
        let cancelled = self.pending.take();
        if let Some(handle) = cancelled {
            log::debug!("hold {} cancelled, epoch now {}", handle.id, self.epoch);
        }
        cancelled
    }

    /// Check that `handle` is the continuation currently pending
    pub fn validate(&self, handle: &HoldHandle) -> Result<()> {
        match self.pending {
            Some(pending) if pending.id == handle.id && handle.epoch == self.epoch => Ok(()),
            _ => Err(SimError::StaleTransition {
                handle: handle.id,
                epoch: handle.epoch,
                current: self.epoch,
            }),
        }
    }

    /// Take the pending continuation if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<HoldHandle> {
        match self.pending {
            Some(handle) if handle.is_due(now) => self.pending.take(),
            _ => None,
        }
    }
}
