//! Deadline responder task body
//!
//! Blocks on the deadline signal with no timeout and reacts once per
//! consumed event. The reaction itself is a placeholder for real control
//! work: it only records when it ran.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::signal::DeadlineSignal;
use crate::traits::MicrosClock;

/// One responder wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reaction {
    /// Wake-up number, starting at 1
    pub sequence: u32,
    /// Time since the previous wake-up (None on the first)
    pub period_us: Option<u64>,
}

/// Responder state carried across wake-ups
pub struct Responder<C> {
    clock: C,
    sequence: u32,
    last_us: Option<u64>,
}

impl<C: MicrosClock> Responder<C> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            sequence: 0,
            last_us: None,
        }
    }

    /// Wait for the next deadline event and react to it
    pub async fn react<M: RawMutex>(&mut self, signal: &DeadlineSignal<M>) -> Reaction {
        signal.take().await;
        self.record()
    }

    /// Record a wake-up that has already been consumed
    pub fn record(&mut self) -> Reaction {
        let now = self.clock.now_us();
        let period_us = self.last_us.map(|last| now.saturating_sub(last));

        self.last_us = Some(now);
        self.sequence = self.sequence.wrapping_add(1);

        Reaction {
            sequence: self.sequence,
            period_us,
        }
    }

    /// Number of reactions so far
    pub fn reactions(&self) -> u32 {
        self.sequence
    }
}
