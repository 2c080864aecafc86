//! Tick divider for the deadline event
//!
//! The tick interrupt handler owns a `TickDivider` outright (no task ever
//! reads it), so the counter needs no synchronization.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::signal::{DeadlineSignal, Give};

/// Counts ticks and fires once every `threshold` ticks
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickDivider {
    count: u32,
    threshold: u32,
}

impl TickDivider {
    /// Create a divider
    ///
    /// A zero threshold is treated as 1 (fire on every tick).
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: if threshold == 0 { 1 } else { threshold },
        }
    }

    /// Account for one tick
    ///
    /// Returns true when the threshold is reached; the count is then reset
    /// to zero.
    pub fn on_tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Ticks accumulated since the last fire
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Tick hook body: divider plus the signal it raises
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineTimer {
    divider: TickDivider,
    raised: u32,
    coalesced: u32,
}

impl DeadlineTimer {
    pub const fn new(threshold: u32) -> Self {
        Self {
            divider: TickDivider::new(threshold),
            raised: 0,
            coalesced: 0,
        }
    }

    /// Handle one tick interrupt
    ///
    /// Gives the signal when the divider fires.
    pub fn on_tick<M: RawMutex>(&mut self, signal: &DeadlineSignal<M>) -> Option<Give> {
        if !self.divider.on_tick() {
            return None;
        }

        let give = signal.give_from_isr();
        match give {
            Give::Raised => self.raised = self.raised.wrapping_add(1),
            Give::Coalesced => self.coalesced = self.coalesced.wrapping_add(1),
        }
        Some(give)
    }

    /// Number of gives that raised the signal
    pub fn raised(&self) -> u32 {
        self.raised
    }

    /// Number of gives absorbed by an already pending signal
    pub fn coalesced(&self) -> u32 {
        self.coalesced
    }

    pub fn divider(&self) -> &TickDivider {
        &self.divider
    }
}
