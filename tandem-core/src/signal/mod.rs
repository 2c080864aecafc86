//! Deadline event signal
//!
//! Binary, interrupt-safe hand-off between the tick interrupt (sole
//! producer) and the responder task (sole consumer).
//!
//! ```text
//!   Empty ──give_from_isr()──► Signaled ──take()──► Empty
//!                                 │
//!                                 └──give_from_isr()──► Signaled (coalesced)
//! ```
//!
//! Gives are not counted: any number of gives between two takes leave a
//! single pending wake-up. The event is a heartbeat, not a quantity.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Observable state of the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalState {
    /// No pending event
    Empty,
    /// One event pending
    Signaled,
}

/// Result of a give
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Give {
    /// Signal went from Empty to Signaled
    Raised,
    /// Signal was already pending; this give was absorbed
    Coalesced,
}

/// Binary semaphore used purely as an event
///
/// Giving only marks the signal and wakes the waiter's executor. With an
/// interrupt executor the wake pends its software interrupt, so the
/// context switch happens when the giving handler returns, never inside it.
pub struct DeadlineSignal<M: RawMutex> {
    inner: Signal<M, ()>,
}

impl<M: RawMutex> DeadlineSignal<M> {
    /// Create an empty signal
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Raise the signal from interrupt context
    ///
    /// Never blocks.
    pub fn give_from_isr(&self) -> Give {
        let outcome = if self.inner.signaled() {
            Give::Coalesced
        } else {
            Give::Raised
        };
        self.inner.signal(());
        outcome
    }

    /// Wait for the signal with no timeout
    ///
    /// Completes only once an event is consumed and leaves the signal empty.
    pub async fn take(&self) {
        self.inner.wait().await
    }

    /// Consume a pending event without waiting
    pub fn try_take(&self) -> bool {
        self.inner.try_take().is_some()
    }

    /// Current state
    pub fn state(&self) -> SignalState {
        if self.inner.signaled() {
            SignalState::Signaled
        } else {
            SignalState::Empty
        }
    }
}

impl<M: RawMutex> Default for DeadlineSignal<M> {
    fn default() -> Self {
        Self::new()
    }
}
